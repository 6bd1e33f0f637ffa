mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rollout",
    about = "Provision the registry and cluster, deploy service A and B, and verify isolation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from rollout.yaml or .git/)
    #[arg(long, global = true, env = "ROLLOUT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full deployment pipeline
    Deploy,

    /// Print the ordered deployment steps without running anything
    Plan,

    /// Check that every required tool is installed
    Check,

    /// Block until the ingress controller pod is Running
    WaitIngress,

    /// Print node and pod status for the current cluster
    Health,

    /// Check that service A cannot reach service B
    Verify,

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy | Commands::WaitIngress => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Deploy => cmd::deploy::run(&root, cli.json),
        Commands::Plan => cmd::plan::run(&root, cli.json),
        Commands::Check => cmd::check::run(cli.json),
        Commands::WaitIngress => cmd::cluster::wait_ingress(&root),
        Commands::Health => cmd::cluster::health(&root, cli.json),
        Commands::Verify => cmd::cluster::verify(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
