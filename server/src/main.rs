use a2s_server::challenge::ChallengePolicy;
use a2s_server::config::{load_fixture, ResponderConfig};
use a2s_server::network::Responder;
use a2s_server::protocol::ServerState;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Answers A2S queries with fixture data", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = "A2S_TESTSERVER_BIND", default_value = "0.0.0.0:27015")]
    bind: String,

    /// JSON file with `server_info` and `player_info` objects
    #[arg(short, long, env = "A2S_TESTSERVER_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Receive buffer size in bytes
    #[arg(long, env = "A2S_TESTSERVER_MAX_PACKET_SIZE", default_value = "1400")]
    max_packet_size: usize,

    /// Issue a random challenge per peer instead of one fixed value
    #[arg(long, env = "A2S_TESTSERVER_PER_PEER_CHALLENGES")]
    per_peer_challenges: bool,

    /// Lifetime of a per-peer challenge
    #[arg(long, env = "A2S_TESTSERVER_CHALLENGE_TTL_SECS", default_value = "30")]
    challenge_ttl_secs: u64,

    /// Maximum number of peers holding a challenge at once
    #[arg(long, env = "A2S_TESTSERVER_CHALLENGE_CAPACITY", default_value = "4096")]
    challenge_capacity: usize,
}

impl Args {
    fn responder_config(&self) -> ResponderConfig {
        let challenge = if self.per_peer_challenges {
            ChallengePolicy::PerPeer {
                ttl: Duration::from_secs(self.challenge_ttl_secs),
                capacity: self.challenge_capacity,
            }
        } else {
            ChallengePolicy::default()
        };

        ResponderConfig {
            max_packet_size: self.max_packet_size,
            challenge,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();

    let state = match &args.fixture {
        Some(path) => {
            info!("Loading fixture from {}", path.display());
            load_fixture(path)?
        }
        None => ServerState::default(),
    };

    let mut responder = Responder::bind(&args.bind, state, args.responder_config()).await?;

    tokio::select! {
        result = responder.serve() => {
            if let Err(e) = result {
                error!("Responder stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
