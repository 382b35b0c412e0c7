//! A2S request and response packets
//!
//! ```text
//! [Header 0xFFFFFFFF (4)] [Type (1)] [Payload (N)]
//! ```

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{ProtocolError, Result};
use crate::types::{GameProfile, PlayerInfo, ServerInfo};

/// Challenge value that asks the server to issue a challenge
pub const REQUEST_CHALLENGE: u32 = 0xFFFF_FFFF;

/// Payload carried by every A2S_INFO request
pub const INFO_REQUEST_PAYLOAD: &str = "Source Engine Query";

pub const INFO_REQUEST: u8 = b'T';
pub const INFO_RESPONSE: u8 = b'I';
pub const PLAYER_REQUEST: u8 = b'U';
pub const CHALLENGE_RESPONSE: u8 = b'A';
pub const PLAYER_RESPONSE: u8 = b'D';

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// A2S_INFO; newer servers expect a challenge echoed after the payload
    InfoRequest { challenge: Option<u32> },
    InfoResponse(ServerInfo),
    /// A2S_PLAYER; carries [`REQUEST_CHALLENGE`] until a challenge is known
    PlayerRequest { challenge: u32 },
    ChallengeResponse(u32),
    PlayerResponse {
        profile: GameProfile,
        info: PlayerInfo,
    },
}

impl Packet {
    pub fn challenge_request() -> Self {
        Packet::PlayerRequest {
            challenge: REQUEST_CHALLENGE,
        }
    }

    pub fn kind(&self) -> u8 {
        match self {
            Packet::InfoRequest { .. } => INFO_REQUEST,
            Packet::InfoResponse(_) => INFO_RESPONSE,
            Packet::PlayerRequest { .. } => PLAYER_REQUEST,
            Packet::ChallengeResponse(_) => CHALLENGE_RESPONSE,
            Packet::PlayerResponse { .. } => PLAYER_RESPONSE,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = PacketWriter::with_header(self.kind());

        match self {
            Packet::InfoRequest { challenge } => {
                w.write_cstring(INFO_REQUEST_PAYLOAD);
                if let Some(challenge) = challenge {
                    w.write_u32(*challenge);
                }
            }
            Packet::InfoResponse(info) => info.write_payload(&mut w),
            Packet::PlayerRequest { challenge } => w.write_u32(*challenge),
            Packet::ChallengeResponse(challenge) => w.write_u32(*challenge),
            Packet::PlayerResponse { profile, info } => info.write_payload(&mut w, *profile),
        }

        w.into_bytes()
    }

    /// Decodes any packet; `profile` only affects player responses
    pub fn decode(bytes: &[u8], profile: GameProfile) -> Result<Self> {
        let mut r = PacketReader::new(bytes);
        let kind = r.read_header()?;

        match kind {
            INFO_REQUEST => {
                // The payload string is optional; a challenge may follow it
                let mut challenge = None;
                if r.has_remaining() {
                    r.read_cstring("info payload")?;
                    if r.remaining() >= 4 {
                        challenge = Some(r.read_u32("challenge")?);
                    }
                }
                Ok(Packet::InfoRequest { challenge })
            }
            INFO_RESPONSE => Ok(Packet::InfoResponse(ServerInfo::read_payload(&mut r)?)),
            PLAYER_REQUEST => Ok(Packet::PlayerRequest {
                challenge: r.read_u32("challenge")?,
            }),
            CHALLENGE_RESPONSE => Ok(Packet::ChallengeResponse(r.read_u32("challenge")?)),
            PLAYER_RESPONSE => Ok(Packet::PlayerResponse {
                profile,
                info: PlayerInfo::read_payload(&mut r, profile)?,
            }),
            other => Err(ProtocolError::UnknownType(other)),
        }
    }
}

fn expect_kind(packet: &Packet, expected: u8) -> ProtocolError {
    ProtocolError::UnexpectedType {
        expected: expected as char,
        found: packet.kind() as char,
    }
}

/// Decodes an A2S_INFO response datagram
pub fn parse_info_response(bytes: &[u8]) -> Result<ServerInfo> {
    match Packet::decode(bytes, GameProfile::Standard)? {
        Packet::InfoResponse(info) => Ok(info),
        other => Err(expect_kind(&other, INFO_RESPONSE)),
    }
}

/// Decodes an A2S_PLAYER response datagram for a server of the given profile
pub fn parse_player_response(bytes: &[u8], profile: GameProfile) -> Result<PlayerInfo> {
    match Packet::decode(bytes, profile)? {
        Packet::PlayerResponse { info, .. } => Ok(info),
        other => Err(expect_kind(&other, PLAYER_RESPONSE)),
    }
}

pub fn parse_challenge_response(bytes: &[u8]) -> Result<u32> {
    match Packet::decode(bytes, GameProfile::Standard)? {
        Packet::ChallengeResponse(challenge) => Ok(challenge),
        other => Err(expect_kind(&other, CHALLENGE_RESPONSE)),
    }
}
