//! # A2S Protocol
//!
//! Wire types shared by the query responder and the query client: the
//! little-endian packet codec, the server and player records, and the five
//! packets of the info and player flows.
//!
//! ## Flows
//! - **Info**: `T` request, `I` response.
//! - **Player**: `U` request carrying `0xFFFFFFFF`, `A` challenge response,
//!   `U` request echoing the challenge, `D` response.
//!
//! ## Usage Example
//!
//! ```rust
//! use a2s::{parse_info_response, Packet, ServerInfo};
//!
//! let info = ServerInfo {
//!     name: "foo".to_string(),
//!     players: 3,
//!     max_players: 6,
//!     ..Default::default()
//! };
//!
//! let bytes = Packet::InfoResponse(info.clone()).encode();
//! assert_eq!(parse_info_response(&bytes).unwrap(), info);
//! ```

pub mod codec;
pub mod error;
pub mod packet;
pub mod types;

pub use codec::{PacketReader, PacketWriter, PACKET_HEADER};
pub use error::{ProtocolError, Result};
pub use packet::{
    parse_challenge_response, parse_info_response, parse_player_response, Packet,
    REQUEST_CHALLENGE,
};
pub use types::{
    ExtendedServerInfo, ExtraDataFlags, GameProfile, Player, PlayerInfo, ServerInfo, ServerOs,
    ServerType, SourceTvInfo, TheShipInfo, TheShipMode, TheShipPlayer, MAX_PLAYERS,
    THE_SHIP_APP_ID,
};

/// Packet size limit used by Source engine servers
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1400;
