//! Node configuration.

use std::time::Duration;

/// Everything a node needs to join a scenario.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Ring size.
    pub n: u32,
    /// This node's index in `[0, n)`.
    pub index: u32,
    /// First port of the ring's port block; node `i` listens on `base_port + i`.
    pub base_port: u16,
    /// Orchestrator report port.
    pub orch_port: u16,
    /// This node's identity. The binary passes the OS process id, which is
    /// stable for the process lifetime and distinct across the scenario's
    /// sibling processes; in-process tests inject their own values.
    pub uid: u64,
    /// Protocol pacing and retry budgets.
    pub timing: Timing,
}

/// Tunable delays and retry budgets.
///
/// The defaults are the experiment's production values; tests shrink them.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Delay before phase 0, giving sibling listeners time to bind.
    pub startup_grace: Duration,
    /// Interval between acknowledgement checks in the phase driver.
    pub ack_poll_interval: Duration,
    /// How long a phase may wait for both acknowledgements, counted from
    /// probe emission, before the node gives up on the election.
    pub phase_timeout: Duration,
    /// Attempt budget for sends to ring peers. Together with the backoff
    /// this covers ~10s of a peer's listener not being bound yet; the
    /// retries run on background send tasks, concurrent with the phase
    /// clock.
    pub peer_retry_attempts: u32,
    /// Fixed delay between peer send attempts.
    pub peer_retry_backoff: Duration,
    /// Attempt budget for the report send. The orchestrator binds before
    /// spawning nodes, so this is almost always first-try.
    pub report_retry_attempts: u32,
    /// Fixed delay between report send attempts.
    pub report_retry_backoff: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(2),
            ack_poll_interval: Duration::from_millis(50),
            phase_timeout: Duration::from_secs(5),
            peer_retry_attempts: 200,
            peer_retry_backoff: Duration::from_millis(50),
            report_retry_attempts: 100,
            report_retry_backoff: Duration::from_millis(100),
        }
    }
}
