//! Inbox dispatcher: the single consumer of inbound envelopes.

use crate::runtime::Shared;
use hsring_messages::Envelope;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Drain the inbox in arrival order, feeding each envelope to the state
/// machine and dispatching its actions before touching the next one.
/// Forwards and reflections go out on background send tasks, so one slow
/// neighbor never stalls the processing of unrelated messages.
///
/// Stops as soon as the node has completed, even with envelopes still
/// queued - after victory, leftover reflections and stragglers of other
/// candidates' probes carry no information anyone needs.
pub(crate) async fn run(mut inbox: mpsc::UnboundedReceiver<Envelope>, shared: Arc<Shared>) {
    while let Some(envelope) = inbox.recv().await {
        if shared.is_completed() {
            break;
        }
        trace!(message = ?envelope.message, side = ?envelope.side, "dispatching");
        let actions = {
            let mut state = shared.state.lock();
            state.handle(envelope.message, envelope.side)
        };
        shared.execute(actions).await;
    }
}
