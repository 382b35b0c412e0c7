//! Responder settings and fixture loading

use crate::challenge::ChallengePolicy;
use crate::protocol::ServerState;
use a2s::{ProtocolError, Result, DEFAULT_MAX_PACKET_SIZE, MAX_PLAYERS, REQUEST_CHALLENGE};
use std::fs;
use std::path::Path;

/// Smallest buffer that still holds a player request
const MIN_PACKET_SIZE: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct ResponderConfig {
    /// Size of the receive buffer; longer datagrams are truncated
    pub max_packet_size: usize,
    pub challenge: ChallengePolicy,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            challenge: ChallengePolicy::default(),
        }
    }
}

impl ResponderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_packet_size < MIN_PACKET_SIZE {
            return Err(ProtocolError::Config(format!(
                "max packet size must be at least {} bytes, got {}",
                MIN_PACKET_SIZE, self.max_packet_size
            )));
        }

        match self.challenge {
            ChallengePolicy::Fixed(REQUEST_CHALLENGE) => Err(ProtocolError::Config(
                "fixed challenge cannot be the request-challenge marker".to_string(),
            )),
            ChallengePolicy::PerPeer { capacity: 0, .. } => Err(ProtocolError::Config(
                "challenge table capacity must be positive".to_string(),
            )),
            ChallengePolicy::PerPeer { ttl, .. } if ttl.is_zero() => Err(ProtocolError::Config(
                "challenge lifetime must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Parses a fixture of the form `{"server_info": {...}, "player_info": {...}}`
///
/// A missing player `count` is filled in from the listed players. A count
/// that disagrees with the list is rejected.
pub fn parse_fixture(json: &str) -> Result<ServerState> {
    let mut state: ServerState = serde_json::from_str(json)
        .map_err(|e| ProtocolError::Config(format!("invalid fixture: {}", e)))?;

    if let Some(player_info) = state.player_info.as_mut() {
        let listed = player_info.players.len();
        if listed > MAX_PLAYERS {
            return Err(ProtocolError::Config(format!(
                "fixture lists {} players, at most {} fit in a response",
                listed, MAX_PLAYERS
            )));
        }
        if player_info.count == 0 {
            player_info.count = listed as u8;
        } else if player_info.count as usize != listed {
            return Err(ProtocolError::Config(format!(
                "fixture player count {} does not match {} listed players",
                player_info.count, listed
            )));
        }
    }

    Ok(state)
}

pub fn load_fixture(path: &Path) -> Result<ServerState> {
    let json = fs::read_to_string(path).map_err(|e| {
        ProtocolError::Config(format!("failed to read fixture {}: {}", path.display(), e))
    })?;
    parse_fixture(&json)
}
