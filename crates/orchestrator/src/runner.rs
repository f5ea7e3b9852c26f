//! One scenario, end to end.

use crate::{collect_reports, spawn_nodes, HarnessTiming, LaunchError, Scenario, ScenarioOutcome};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to bind report listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// How to run scenarios.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// The node executable to spawn.
    pub node_bin: PathBuf,
    pub timing: HarnessTiming,
}

/// Run one scenario: bind, spawn, collect, wait, validate.
///
/// Failures of the ring itself (missing or disagreeing reports, dirty
/// exits) are not errors - they come back as a failed [`ScenarioOutcome`].
/// Errors mean the harness could not even stage the experiment.
pub async fn run_scenario(
    scenario: &Scenario,
    options: &RunnerOptions,
) -> Result<ScenarioOutcome, ScenarioError> {
    info!(
        n = scenario.n,
        base_port = scenario.base_port,
        orch_port = scenario.orch_port,
        "starting scenario"
    );

    // The report listener must exist before any node does: a node that
    // finishes instantly would otherwise burn its report retries against a
    // closed port.
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, scenario.orch_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ScenarioError::Bind { addr, source })?;
    let collect = tokio::spawn(collect_reports(
        listener,
        scenario.n as usize,
        options.timing.scenario_deadline,
    ));

    let mut nodes = match spawn_nodes(scenario, &options.node_bin) {
        Ok(nodes) => nodes,
        Err(e) => {
            collect.abort();
            return Err(e.into());
        }
    };
    let expected_uids: Vec<u64> = nodes.iter().map(|node| node.uid).collect();
    info!(?expected_uids, "ring launched");

    let reports = collect.await.unwrap_or_default();

    let mut all_exited = true;
    for node in &mut nodes {
        if !node.wait_or_kill(options.timing.child_exit_timeout).await {
            all_exited = false;
        }
    }

    let outcome = ScenarioOutcome::evaluate(scenario.n, expected_uids, reports, all_exited);
    if !outcome.passed() {
        warn!(verdict = ?outcome.verdict, "scenario failed");
        for node in &mut nodes {
            let stderr = node.stderr_output().await;
            if !stderr.trim().is_empty() {
                eprintln!(
                    "--- node {} (uid {}) stderr ---\n{}",
                    node.index, node.uid, stderr
                );
            }
        }
    }
    Ok(outcome)
}
