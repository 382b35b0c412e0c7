//! Request dispatch for the query responder
//!
//! Every datagram is handled on its own. The only state carried between
//! datagrams is whatever the [`ChallengeTable`] keeps for its policy.

use crate::challenge::{ChallengePolicy, ChallengeTable};
use a2s::packet::{INFO_REQUEST, PLAYER_REQUEST};
use a2s::{
    GameProfile, Packet, PacketReader, PlayerInfo, ProtocolError, Result, ServerInfo, ServerType,
    REQUEST_CHALLENGE,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// Data the responder answers with; read-only while serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerState {
    pub server_info: Option<ServerInfo>,
    pub player_info: Option<PlayerInfo>,
}

impl ServerState {
    pub fn new(server_info: Option<ServerInfo>, player_info: Option<PlayerInfo>) -> Self {
        Self {
            server_info,
            player_info,
        }
    }

    fn profile(&self) -> GameProfile {
        self.server_info
            .as_ref()
            .map(ServerInfo::profile)
            .unwrap_or_default()
    }

    fn is_source_tv(&self) -> bool {
        self.server_info
            .as_ref()
            .map(|info| info.server_type == ServerType::SourceTv)
            .unwrap_or(false)
    }
}

/// Turns request datagrams into response packets
#[derive(Debug)]
pub struct QueryHandler {
    state: Arc<ServerState>,
    challenges: ChallengeTable,
}

impl QueryHandler {
    pub fn new(state: Arc<ServerState>, policy: ChallengePolicy) -> Self {
        Self {
            state,
            challenges: ChallengeTable::new(policy),
        }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Decides the response to one datagram
    ///
    /// `Ok(None)` means the request is valid but deliberately unanswered: a
    /// stale challenge, or a player query against a SourceTV relay. Errors
    /// describe malformed input and never concern the transport.
    pub fn handle(&mut self, datagram: &[u8], peer: SocketAddr) -> Result<Option<Packet>> {
        let mut r = PacketReader::new(datagram);

        match r.read_header()? {
            INFO_REQUEST => {
                let info = self.state.server_info.clone().unwrap_or_default();
                Ok(Some(Packet::InfoResponse(info)))
            }
            PLAYER_REQUEST => {
                let challenge = r.read_u32("challenge")?;
                self.handle_player_request(challenge, peer)
            }
            other => Err(ProtocolError::UnknownType(other)),
        }
    }

    fn handle_player_request(
        &mut self,
        challenge: u32,
        peer: SocketAddr,
    ) -> Result<Option<Packet>> {
        if challenge == REQUEST_CHALLENGE {
            let issued = self.challenges.issue(peer);
            return Ok(Some(Packet::ChallengeResponse(issued)));
        }

        if !self.challenges.verify(peer, challenge) {
            debug!(
                "Ignoring player request from {} with stale challenge {:#010x}",
                peer, challenge
            );
            return Ok(None);
        }

        if self.state.is_source_tv() {
            debug!("SourceTV relay ignores player request from {}", peer);
            return Ok(None);
        }

        Ok(Some(Packet::PlayerResponse {
            profile: self.state.profile(),
            info: self.state.player_info.clone().unwrap_or_default(),
        }))
    }

    /// Encoded reply for a datagram, or `None` when nothing should be sent
    pub fn respond(&mut self, datagram: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
        match self.handle(datagram, peer) {
            Ok(packet) => packet.map(|p| p.encode()),
            Err(e) => {
                debug!("Dropping datagram from {}: {}", peer, e);
                None
            }
        }
    }
}
