//! Async runtime for one election node.
//!
//! A node is one OS process on the ring. Internally it runs three
//! cooperating tasks on top of the synchronous election state machine:
//!
//! - **Listener**: accepts loopback TCP connections on `basePort + index`
//!   and reads line-delimited JSON messages into the inbox
//! - **Inbox dispatcher**: single consumer draining the inbox in arrival
//!   order, feeding the state machine and executing its actions
//! - **Phase driver**: paces the election - emits each phase's probes and
//!   polls for their acknowledgements
//!
//! Outbound traffic goes through a retrying sender that opens a fresh
//! connection per message; the retry budget papers over the startup window
//! in which peers have not bound their listeners yet. The first task to
//! decide the node is done (victory, announcement, or phase timeout)
//! signals the runtime, which sends at most one report to the orchestrator
//! and tears the tasks down.

mod config;
mod driver;
mod inbox;
mod listener;
mod runtime;
mod sender;

pub use config::{NodeConfig, Timing};
pub use runtime::{ExitReason, NodeError, NodeRuntime};
pub use sender::RingSender;
