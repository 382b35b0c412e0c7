use a2s_client::collector::{render, Collector};
use a2s_client::network::{QueryClient, QueryConfig};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Queries an A2S server and prints its metrics",
    long_about = None
)]
struct Args {
    /// Query address of the game server as host:port
    #[arg(short, long, env = "A2S_EXPORTER_QUERY_ADDRESS")]
    address: String,

    /// Prefix for all metric names
    #[arg(short, long, env = "A2S_EXPORTER_NAMESPACE", default_value = "a2s")]
    namespace: String,

    /// Largest response datagram accepted from the server
    #[arg(long, env = "A2S_EXPORTER_MAX_PACKET_SIZE", default_value = "1400")]
    max_packet_size: usize,

    /// Deadline for each response in milliseconds
    #[arg(short, long, env = "A2S_EXPORTER_TIMEOUT_MS", default_value = "1000")]
    timeout_ms: u64,

    /// Only query server info
    #[arg(long, env = "A2S_EXPORTER_SKIP_PLAYERS")]
    skip_players: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args = Args::parse();

    let config = QueryConfig {
        timeout: Duration::from_millis(args.timeout_ms),
        max_packet_size: args.max_packet_size,
    };

    info!("Querying {}", args.address);
    let client = QueryClient::connect(&args.address, config).await?;

    let samples = Collector::new(&args.namespace, !args.skip_players)
        .collect(&client)
        .await;
    print!("{}", render(&samples));

    Ok(())
}
