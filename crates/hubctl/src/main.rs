use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use hub_cluster::cli::{HubCmd, TargetOpt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    cli.command.process(cli.target).await
}

fn init_tracing(level: Level) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_level(value: &str) -> Result<Level, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not one of error, warn, info, debug, trace"))
}

#[derive(Debug, Parser)]
#[command(
    about = "Deploy and manage Black Duck instances on Kubernetes and OpenShift",
    name = "hubctl",
    max_term_width = 100
)]
struct Cli {
    #[command(flatten)]
    target: TargetOpt,

    /// Log verbosity: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "info", value_parser = parse_level, global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: HubCmd,
}
