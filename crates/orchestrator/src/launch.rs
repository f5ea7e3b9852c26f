//! Node process launching and teardown.

use crate::Scenario;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn node {index}: {source}")]
    Spawn {
        index: u32,
        source: std::io::Error,
    },

    #[error("node {index} died before its pid could be read")]
    NoPid { index: u32 },
}

/// A spawned node process.
///
/// The child's pid is its election UID; stderr is buffered in the
/// background so it can be surfaced if the scenario fails.
pub struct LaunchedNode {
    pub index: u32,
    pub uid: u64,
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl LaunchedNode {
    /// Wait for a clean exit, killing the child once the grace runs out.
    /// Returns whether the child exited by itself with status 0.
    pub async fn wait_or_kill(&mut self, grace: Duration) -> bool {
        match timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(index = self.index, %status, "node exited");
                status.success()
            }
            Ok(Err(e)) => {
                warn!(index = self.index, error = %e, "waiting for node failed");
                false
            }
            Err(_) => {
                warn!(index = self.index, "node still running after grace, killing");
                if let Err(e) = self.child.start_kill() {
                    warn!(index = self.index, error = %e, "kill failed");
                }
                let _ = self.child.wait().await;
                false
            }
        }
    }

    /// Everything the child wrote to stderr. Call after the child is gone.
    pub async fn stderr_output(&mut self) -> String {
        match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Spawn the scenario's nodes in index order, pids recorded as UIDs.
///
/// On any spawn failure the already-running children are killed before the
/// error is returned - a partial ring can never elect.
pub fn spawn_nodes(scenario: &Scenario, node_bin: &Path) -> Result<Vec<LaunchedNode>, LaunchError> {
    let mut nodes: Vec<LaunchedNode> = Vec::with_capacity(scenario.n as usize);
    for index in 0..scenario.n {
        match spawn_node(scenario, node_bin, index) {
            Ok(node) => nodes.push(node),
            Err(e) => {
                warn!(index, error = %e, "spawn failed, tearing down the partial ring");
                for node in &mut nodes {
                    let _ = node.child.start_kill();
                }
                return Err(e);
            }
        }
    }
    Ok(nodes)
}

fn spawn_node(
    scenario: &Scenario,
    node_bin: &Path,
    index: u32,
) -> Result<LaunchedNode, LaunchError> {
    let mut child = Command::new(node_bin)
        .arg("--n")
        .arg(scenario.n.to_string())
        .arg("--index")
        .arg(index.to_string())
        .arg("--basePort")
        .arg(scenario.base_port.to_string())
        .arg("--orchPort")
        .arg(scenario.orch_port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| LaunchError::Spawn { index, source })?;

    let uid = u64::from(child.id().ok_or(LaunchError::NoPid { index })?);
    let stderr = child.stderr.take().map(|mut pipe| {
        tokio::spawn(async move {
            let mut buffer = String::new();
            let _ = pipe.read_to_string(&mut buffer).await;
            buffer
        })
    });
    debug!(index, uid, "node spawned");

    Ok(LaunchedNode {
        index,
        uid,
        child,
        stderr,
    })
}
