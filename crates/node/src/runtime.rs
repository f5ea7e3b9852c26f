//! Node runtime: task wiring, action execution, completion.

use crate::{config::NodeConfig, driver, inbox, listener, sender::RingSender};
use hsring_election::{Action, ElectionState};
use hsring_messages::{WireMessage, NO_WINNER};
use hsring_types::RingPosition;
use parking_lot::Mutex;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Errors that keep a node from starting.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid ring geometry: n={n}, index={index}, basePort={base_port}")]
    InvalidGeometry { n: u32, index: u32, base_port: u16 },

    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Why the runtime stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The node learned the winner and delivered its report.
    Completed,
    /// A phase starved for acknowledgements; no report was sent and the
    /// orchestrator will fail the scenario on the missing one.
    PhaseTimeout,
}

/// Context shared by the listener, dispatcher, and driver tasks.
pub(crate) struct Shared {
    pub(crate) config: NodeConfig,
    pub(crate) position: RingPosition,
    /// Guards the phase/ack state the dispatcher and driver co-mutate.
    /// Never held across an await: handlers update state first, then the
    /// returned actions are executed.
    pub(crate) state: Mutex<ElectionState>,
    pub(crate) sender: Arc<RingSender>,
    /// Single-shot gate for the report-and-exit transition.
    completed: AtomicBool,
    exit_tx: mpsc::Sender<ExitReason>,
}

impl Shared {
    pub(crate) fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// Execute state-machine actions in order.
    ///
    /// Probe, forward, and reflection sends are handed to background tasks:
    /// their delivery feeds other nodes' inboxes, never this node's control
    /// flow, and the peer retry budget (~10s against an unbound listener)
    /// is larger than the phase timeout, so the driver's ack clock must
    /// start at emission rather than behind a slow neighbor. Announcement
    /// sends are the exception and are awaited inline: the relay has to be
    /// on the wire, or given up on, before `Complete` shuts the node down,
    /// or the announcement wave could die with this process.
    pub(crate) async fn execute(&self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Send { to, message } => {
                    let port = self.position.neighbor_port(to);
                    if matches!(message, WireMessage::Announce { .. }) {
                        self.sender.send_protocol(port, &message).await;
                    } else {
                        let sender = self.sender.clone();
                        tokio::spawn(async move {
                            sender.send_protocol(port, &message).await;
                        });
                    }
                }
                Action::Complete => self.complete().await,
            }
        }
    }

    /// The completion transition: at most one report, then exit.
    pub(crate) async fn complete(&self) {
        if self
            .completed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let (winner, rounds) = {
            let state = self.state.lock();
            (state.winner(), state.rounds())
        };
        let report = WireMessage::Report {
            uid: self.config.uid,
            winner: winner.map(|w| w as i64).unwrap_or(NO_WINNER),
            rounds,
            messages: self.sender.messages_sent(),
        };
        debug!(?report, "sending report");
        self.sender.send_report(self.config.orch_port, &report).await;
        let _ = self.exit_tx.try_send(ExitReason::Completed);
    }

    /// Driver-side exit path for a starved phase. No report.
    pub(crate) fn abandon(&self) {
        let _ = self.exit_tx.try_send(ExitReason::PhaseTimeout);
    }
}

/// One election participant.
pub struct NodeRuntime {
    config: NodeConfig,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Run the node to completion: bind, elect, report, tear down.
    pub async fn run(self) -> Result<ExitReason, NodeError> {
        let config = self.config;
        let position = RingPosition::new(config.n, config.index, config.base_port).ok_or(
            NodeError::InvalidGeometry {
                n: config.n,
                index: config.index,
                base_port: config.base_port,
            },
        )?;

        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, position.listen_port()));
        let tcp = TcpListener::bind(addr)
            .await
            .map_err(|source| NodeError::Bind { addr, source })?;
        info!(
            uid = config.uid,
            index = config.index,
            n = config.n,
            %addr,
            "node listening"
        );

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (exit_tx, mut exit_rx) = mpsc::channel(2);
        let shared = Arc::new(Shared {
            state: Mutex::new(ElectionState::new(config.uid, position)),
            sender: Arc::new(RingSender::new(config.timing.clone())),
            completed: AtomicBool::new(false),
            exit_tx,
            position,
            config,
        });

        let listener_task = tokio::spawn(listener::run(tcp, position, inbox_tx));
        let dispatcher_task = tokio::spawn(inbox::run(inbox_rx, shared.clone()));
        let driver_task = tokio::spawn(driver::run(shared.clone()));

        // First exit signal wins; everything else is torn down behind it.
        let reason = exit_rx.recv().await.unwrap_or(ExitReason::PhaseTimeout);
        listener_task.abort();
        dispatcher_task.abort();
        driver_task.abort();
        info!(?reason, "node shutting down");
        Ok(reason)
    }
}
