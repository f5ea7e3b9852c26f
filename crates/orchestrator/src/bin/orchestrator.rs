//! Election orchestrator binary.
//!
//! Runs one scenario or the default sweep:
//!
//! ```bash
//! # Single scenario on the default ports
//! hsring-orchestrator --n 10
//!
//! # Prompt for N interactively; answering 0 runs the default sweep
//! hsring-orchestrator
//! ```
//!
//! Exits 0 iff every scenario's self-check passed.

use anyhow::Context;
use clap::Parser;
use hsring_orchestrator::{default_sweep, run_scenario, HarnessTiming, RunnerOptions, Scenario};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Election scenario orchestrator
///
/// Spawns rings of election nodes over loopback TCP, validates their
/// reports, and prints a per-scenario verdict.
#[derive(Parser, Debug)]
#[command(name = "hsring-orchestrator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Ring size; prompted for when omitted. 0 runs the default sweep.
    #[arg(long)]
    n: Option<u32>,

    /// First port of the ring's port block
    #[arg(long = "basePort", default_value_t = 50_000)]
    base_port: u16,

    /// Report collection port
    #[arg(long = "orchPort", default_value_t = 40_000)]
    orch_port: u16,

    /// Node executable (defaults to a sibling of this binary)
    #[arg(long = "node-bin")]
    node_bin: Option<PathBuf>,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn prompt_for_n() -> anyhow::Result<u32> {
    print!("Ring size N (0 = default sweep): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read N from stdin")?;
    line.trim()
        .parse()
        .context("N must be a non-negative integer")
}

fn default_node_bin() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join(format!("hsring-node{}", std::env::consts::EXE_SUFFIX)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let n = match cli.n {
        Some(n) => n,
        None => prompt_for_n()?,
    };
    let scenarios = if n == 0 {
        default_sweep()
    } else {
        vec![Scenario::new(n, cli.base_port, cli.orch_port)]
    };

    let options = RunnerOptions {
        node_bin: match cli.node_bin {
            Some(path) => path,
            None => default_node_bin()?,
        },
        timing: HarnessTiming::default(),
    };

    let mut all_passed = true;
    for scenario in &scenarios {
        match run_scenario(scenario, &options).await {
            Ok(outcome) => {
                outcome.print_block();
                all_passed &= outcome.passed();
            }
            Err(e) => {
                error!(n = scenario.n, error = %e, "scenario could not be staged");
                all_passed = false;
            }
        }
    }

    println!(
        "OverallSelfCheck={}",
        if all_passed { "PASS" } else { "FAIL" }
    );
    if !all_passed {
        std::process::exit(1);
    }
    Ok(())
}
