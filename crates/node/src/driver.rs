//! Phase driver: paces the election from phase 0 upward.

use crate::runtime::Shared;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Run phases until a winner is known or a phase starves.
///
/// Each iteration emits the current phase's two probes and then polls the
/// ack bits at a coarse interval. Victory is detected by the dispatcher
/// (the returning probe arrives through the inbox); the driver just stops
/// emitting once a winner exists.
pub(crate) async fn run(shared: Arc<Shared>) {
    let timing = shared.config.timing.clone();

    // Give the sibling processes a moment to bind their listeners. The
    // sender's retry budget covers stragglers beyond this.
    sleep(timing.startup_grace).await;
    debug!("phase driver starting");

    loop {
        let actions = {
            let mut state = shared.state.lock();
            if state.winner().is_some() {
                return;
            }
            state.begin_phase()
        };
        shared.execute(actions).await;

        // The probes went out on background send tasks, so the ack clock
        // starts at emission even when a neighbor is still coming up.
        let deadline = Instant::now() + timing.phase_timeout;
        loop {
            {
                let state = shared.state.lock();
                if state.winner().is_some() {
                    return;
                }
                if state.phase_acked() {
                    break;
                }
            }
            if Instant::now() >= deadline {
                let phase = {
                    let mut state = shared.state.lock();
                    state.deactivate();
                    state.phase()
                };
                warn!(phase, "phase starved for acknowledgements, giving up");
                shared.abandon();
                return;
            }
            sleep(timing.ack_poll_interval).await;
        }

        shared.state.lock().advance_phase();
    }
}
