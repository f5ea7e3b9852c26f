//! Wire messages for the hsring election protocol.
//!
//! # Wire Format
//!
//! One JSON object per line, UTF-8, newline-terminated, camelCase field
//! names. The message kind is an internal `"type"` tag:
//!
//! ```text
//! {"type":"OUT","uid":41923,"phase":1,"ttl":2,"dir":"L","senderIndex":4}
//! ```
//!
//! Unknown fields are ignored; lines with unknown `"type"` values (or any
//! other parse failure) are dropped by the receiver - messages are
//! independent, so a bad line never poisons its connection.

mod envelope;
mod wire;

pub use envelope::Envelope;
pub use wire::{CodecError, WireMessage, NO_WINNER};
