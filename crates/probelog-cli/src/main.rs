//! probelog - simulated sensor telemetry over TCP with a rotating CSV store.
//!
//! Run the collector with `probelog server -c config.json`, then one or
//! more clients with `probelog client -c config.json -i 3`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use config::Config;

mod client;
mod config;
mod server;
mod telemetry;

/// Sensor telemetry client and collector.
#[derive(Parser, Debug)]
#[command(name = "probelog")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the JSON configuration file.
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample the simulated sensor bank and stream payloads to a collector.
    Client {
        /// Seconds between sampling cycles.
        #[arg(short, long, default_value_t = 3.0)]
        interval: f64,
    },

    /// Accept client connections, print payloads, and record telemetry.
    Server,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("probelog_cli=info".parse()?)
                .add_directive("probelog_net=info".parse()?)
                .add_directive("probelog_store=info".parse()?),
        )
        .init();

    let config = Config::load(&args.config)?;

    match args.command {
        Command::Client { interval } => {
            anyhow::ensure!(
                interval > 0.0 && interval.is_finite(),
                "interval must be a positive number of seconds"
            );
            client::run(config, Duration::from_secs_f64(interval)).await
        }
        Command::Server => server::run(config).await,
    }
}
