//! Inbound envelope: a parsed message plus where it came from.

use crate::WireMessage;
use hsring_types::{RingPosition, Side};

/// A received message tagged with the ring side it arrived from.
///
/// The side is resolved once at the listener from the message's
/// `senderIndex`; messages without one (reports, which should never arrive
/// on a ring port) classify as [`Side::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message: WireMessage,
    pub side: Side,
}

impl Envelope {
    /// Wrap a message received at `position`, classifying its origin.
    pub fn received(message: WireMessage, position: &RingPosition) -> Self {
        let side = message
            .sender_index()
            .map(|index| position.classify_sender(index))
            .unwrap_or(Side::Unknown);
        Self { message, side }
    }
}
