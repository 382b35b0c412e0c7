//! # A2S Query Client
//!
//! Queries a Source engine game server over the A2S protocol and turns the
//! answers into gauge samples for a metrics exporter.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Runs the two query flows against one server:
//! - info query, answering a challenge when newer servers ask for one
//! - player query with the mandatory challenge round trip
//!
//! Every response is awaited with a deadline; there are no retries.
//!
//! ### Collector Module (`collector`)
//! Maps the decoded server and player records onto named, labeled samples
//! and renders them in the text exposition format.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use a2s_client::collector::{render, Collector};
//! use a2s_client::network::{QueryClient, QueryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QueryClient::connect("127.0.0.1:27015", QueryConfig::default()).await?;
//!     let samples = Collector::new("a2s", true).collect(&client).await;
//!     print!("{}", render(&samples));
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod network;
