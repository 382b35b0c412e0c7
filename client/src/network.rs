//! Client side of the info and player query flows

use a2s::packet::CHALLENGE_RESPONSE;
use a2s::{
    parse_challenge_response, parse_info_response, parse_player_response, GameProfile, Packet,
    PacketReader, PlayerInfo, ProtocolError, Result, ServerInfo, DEFAULT_MAX_PACKET_SIZE,
};
use log::debug;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Deadline for each response datagram
    pub timeout: Duration,
    pub max_packet_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// UDP client for a single A2S server
#[derive(Debug)]
pub struct QueryClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    config: QueryConfig,
}

impl QueryClient {
    /// Resolves `addr` (`host:port`) and binds a local socket of the same family
    pub async fn connect(addr: &str, config: QueryConfig) -> Result<Self> {
        let server_addr = lookup_host(addr)
            .await?
            .next()
            .ok_or_else(|| ProtocolError::Config(format!("could not resolve {}", addr)))?;

        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;

        Ok(QueryClient {
            socket,
            server_addr,
            config,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    async fn exchange(&self, request: &Packet) -> Result<Vec<u8>> {
        self.socket.send(&request.encode()).await?;

        let mut buffer = vec![0u8; self.config.max_packet_size];
        let len = timeout(self.config.timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        buffer.truncate(len);
        Ok(buffer)
    }

    /// Queries A2S_INFO, answering a challenge if the server asks for one
    pub async fn query_info(&self) -> Result<ServerInfo> {
        let mut reply = self.exchange(&Packet::InfoRequest { challenge: None }).await?;

        if packet_kind(&reply)? == CHALLENGE_RESPONSE {
            let challenge = parse_challenge_response(&reply)?;
            debug!("{} requires challenge {:#010x} for info", self.server_addr, challenge);
            reply = self
                .exchange(&Packet::InfoRequest {
                    challenge: Some(challenge),
                })
                .await?;
        }

        parse_info_response(&reply)
    }

    /// Queries A2S_PLAYER through the challenge round trip
    ///
    /// `profile` must come from the server's info response so that The Ship
    /// player records decode correctly.
    pub async fn query_players(&self, profile: GameProfile) -> Result<PlayerInfo> {
        let mut reply = self.exchange(&Packet::challenge_request()).await?;

        // Some servers skip the challenge and answer directly
        if packet_kind(&reply)? == CHALLENGE_RESPONSE {
            let challenge = parse_challenge_response(&reply)?;
            reply = self.exchange(&Packet::PlayerRequest { challenge }).await?;
        }

        parse_player_response(&reply, profile)
    }
}

fn packet_kind(bytes: &[u8]) -> Result<u8> {
    PacketReader::new(bytes).read_header()
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2s::{Player, THE_SHIP_APP_ID};

    /// Answers each request with the next canned reply
    async fn scripted_server(
        replies: Vec<Vec<u8>>,
    ) -> (SocketAddr, tokio::task::JoinHandle<Vec<Vec<u8>>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            let mut buf = [0u8; 1400];
            for reply in replies {
                let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
                requests.push(buf[..len].to_vec());
                socket.send_to(&reply, peer).await.unwrap();
            }
            requests
        });

        (addr, handle)
    }

    #[tokio::test]
    async fn test_query_info_with_challenge() {
        let info = ServerInfo {
            name: "foo".to_string(),
            ..Default::default()
        };
        let (addr, server) = scripted_server(vec![
            Packet::ChallengeResponse(0x0A0B_0C0D).encode(),
            Packet::InfoResponse(info.clone()).encode(),
        ])
        .await;

        let client = QueryClient::connect(&addr.to_string(), QueryConfig::default())
            .await
            .unwrap();
        assert_eq!(client.query_info().await.unwrap(), info);

        let requests = server.await.unwrap();
        assert_eq!(
            Packet::decode(&requests[1], GameProfile::Standard).unwrap(),
            Packet::InfoRequest {
                challenge: Some(0x0A0B_0C0D)
            }
        );
    }

    #[tokio::test]
    async fn test_query_players_echoes_challenge() {
        let players = PlayerInfo::new(vec![Player {
            index: 0,
            name: "jon".to_string(),
            score: 4,
            duration: 234.0,
            the_ship: Some(Default::default()),
        }]);
        let profile = GameProfile::from_app_id(THE_SHIP_APP_ID);
        let (addr, server) = scripted_server(vec![
            Packet::ChallengeResponse(77).encode(),
            Packet::PlayerResponse {
                profile,
                info: players.clone(),
            }
            .encode(),
        ])
        .await;

        let client = QueryClient::connect(&addr.to_string(), QueryConfig::default())
            .await
            .unwrap();
        assert_eq!(client.query_players(profile).await.unwrap(), players);

        let requests = server.await.unwrap();
        assert_eq!(requests[0], Packet::challenge_request().encode());
        assert_eq!(requests[1], Packet::PlayerRequest { challenge: 77 }.encode());
    }

    #[tokio::test]
    async fn test_query_times_out() {
        // Bound but never answers
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = silent.local_addr().unwrap();

        let config = QueryConfig {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let client = QueryClient::connect(&addr.to_string(), config).await.unwrap();

        assert!(matches!(client.query_info().await, Err(ProtocolError::Timeout)));
    }

    #[test]
    fn test_unresolvable_address() {
        let result = tokio_test::block_on(QueryClient::connect(
            "not an address",
            QueryConfig::default(),
        ));
        tokio_test::assert_err!(result);
    }
}
