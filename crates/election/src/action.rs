//! Actions returned by the election state machine.

use hsring_messages::WireMessage;
use hsring_types::Direction;

/// What the runtime must do after handling an input.
///
/// Actions are **commands**: the state machine has already updated itself,
/// and the runtime executes them in order. Ordering matters - announcement
/// relays are emitted before [`Action::Complete`] so the neighbor receives
/// the relay even though this node is about to shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a message to the neighbor the direction points at
    /// (`L` = left neighbor, `R` = right neighbor).
    Send {
        to: Direction,
        message: WireMessage,
    },

    /// Run the completion transition: emit the single REPORT and shut the
    /// node down. Idempotent at the runtime (compare-and-set guarded).
    Complete,
}
