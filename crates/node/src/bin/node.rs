//! Election node binary.
//!
//! One process on the ring. Usage:
//!
//! ```bash
//! hsring-node --n 10 --index 3 --basePort 51000 --orchPort 41000
//! ```
//!
//! The node's UID is its OS process id; the orchestrator records the pids
//! it spawned and cross-checks them against the reported winner.

use clap::Parser;
use hsring_node::{NodeConfig, NodeRuntime, Timing};
use tracing_subscriber::EnvFilter;

/// Election ring node
///
/// Joins a loopback election ring, reports the outcome to the
/// orchestrator, and exits.
#[derive(Parser, Debug)]
#[command(name = "hsring-node")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Ring size
    #[arg(long)]
    n: u32,

    /// This node's index in [0, n)
    #[arg(long)]
    index: u32,

    /// First port of the ring's port block
    #[arg(long = "basePort")]
    base_port: u16,

    /// Orchestrator report port
    #[arg(long = "orchPort")]
    orch_port: u16,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Argument errors must exit with status 1, not clap's default 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Logs go to stderr: the orchestrator captures them and surfaces them
    // when a scenario fails.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = NodeConfig {
        n: cli.n,
        index: cli.index,
        base_port: cli.base_port,
        orch_port: cli.orch_port,
        uid: u64::from(std::process::id()),
        timing: Timing::default(),
    };

    NodeRuntime::new(config).run().await?;
    Ok(())
}
