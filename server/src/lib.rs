//! # A2S Query Responder
//!
//! A UDP server that answers Source engine A2S queries from fixed server and
//! player data. It stands in for a real game server when testing query
//! clients and exporters.
//!
//! ## Module Organization
//!
//! ### Challenge Module (`challenge`)
//! Issues and verifies the challenge a client must echo to receive player
//! data, either one fixed value or a random value per peer address.
//!
//! ### Protocol Module (`protocol`)
//! Validates each datagram and decides the response:
//! - `T` is answered with the server info
//! - `U` with the marker value is answered with a challenge
//! - `U` with a valid challenge is answered with the player list, except on
//!   SourceTV relays, which never answer player queries
//! - anything else is dropped
//!
//! ### Network Module (`network`)
//! Runs the receive loop on a UDP socket. Malformed datagrams are dropped;
//! socket failures end the loop.
//!
//! ### Config Module (`config`)
//! Responder settings and JSON fixture loading.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use a2s::ServerInfo;
//! use a2s_server::config::ResponderConfig;
//! use a2s_server::network::Responder;
//! use a2s_server::protocol::ServerState;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let info = ServerInfo {
//!         name: "foo".to_string(),
//!         max_players: 6,
//!         ..Default::default()
//!     };
//!
//!     let mut responder = Responder::bind(
//!         "127.0.0.1:27015",
//!         ServerState::new(Some(info), None),
//!         ResponderConfig::default(),
//!     )
//!     .await?;
//!
//!     responder.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod challenge;
pub mod config;
pub mod network;
pub mod protocol;
