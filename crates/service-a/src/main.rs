use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use service_a::liveness::DEFAULT_LIVENESS_PATH;
use service_a::price::{CoinGecko, DEFAULT_API_BASE};
use service_a::worker::{Worker, WorkerConfig};

#[derive(Parser)]
#[command(name = "service-a", about = "Log the Bitcoin price and its rolling average", version)]
struct Args {
    /// Quote currency
    #[arg(long, env = "CURRENCY", default_value = "usd")]
    currency: String,

    /// Seconds between price fetches
    #[arg(long, env = "FETCH_INTERVAL_SECS", default_value_t = 60)]
    interval_secs: u64,

    /// Seconds covered by each average
    #[arg(long, env = "AVERAGE_INTERVAL_SECS", default_value_t = 600)]
    avg_interval_secs: u64,

    /// Price API base URL
    #[arg(long, env = "COINGECKO_API_URL", default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// File touched after every successful fetch
    #[arg(long, env = "LIVENESS_PATH", default_value = DEFAULT_LIVENESS_PATH)]
    liveness_path: PathBuf,

    /// CoinGecko API key, sent as x-cg-pro-api-key
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let source = CoinGecko::new(&args.api_url, &args.currency, args.api_key)
        .context("failed to build HTTP client")?;

    let config = WorkerConfig {
        currency: source.currency().to_string(),
        interval: Duration::from_secs(args.interval_secs),
        avg_interval: Duration::from_secs(args.avg_interval_secs),
        liveness_path: args.liveness_path,
    };
    tracing::info!(
        currency = %config.currency,
        interval_secs = args.interval_secs,
        window = config.window_cycles(),
        "starting price worker"
    );

    Worker::new(&source, config).run(std::thread::sleep)
}
