//! Server network layer answering A2S queries over UDP

use crate::config::ResponderConfig;
use crate::protocol::{QueryHandler, ServerState};
use a2s::Result;
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// UDP responder serving a fixed [`ServerState`]
pub struct Responder {
    socket: UdpSocket,
    handler: QueryHandler,
    max_packet_size: usize,
}

impl Responder {
    pub async fn bind(addr: &str, state: ServerState, config: ResponderConfig) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let responder = Self::from_socket(socket, state, config)?;
        info!("Responder listening on {}", responder.local_addr()?);
        Ok(responder)
    }

    pub fn from_socket(
        socket: UdpSocket,
        state: ServerState,
        config: ResponderConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Responder {
            socket,
            handler: QueryHandler::new(Arc::new(state), config.challenge),
            max_packet_size: config.max_packet_size,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Answers queries until the socket fails
    ///
    /// Malformed datagrams are dropped and the loop keeps going; a failed
    /// receive or send ends the loop with that error.
    pub async fn serve(&mut self) -> Result<()> {
        let mut buffer = vec![0u8; self.max_packet_size];

        loop {
            let (len, addr) = match self.socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    return Err(e.into());
                }
            };

            let Some(reply) = self.handler.respond(&buffer[..len], addr) else {
                continue;
            };

            if let Err(e) = self.socket.send_to(&reply, addr).await {
                error!("Failed to send response to {}: {}", addr, e);
                return Err(e.into());
            }
            debug!("Sent {} byte response to {}", reply.len(), addr);
        }
    }
}
