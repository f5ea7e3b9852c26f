//! Message encoding and decoding for the line-delimited JSON transport.

use hsring_types::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel reported as the winner by a node that never learned one.
pub const NO_WINNER: i64 = -1;

/// Errors from message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed message line: {0}")]
    Json(#[from] serde_json::Error),
}

/// The four message kinds exchanged in one scenario.
///
/// `Out`/`In`/`Announce` travel between ring neighbors; `Report` travels
/// from a node to the orchestrator. `uid` is the originating candidate for
/// protocol messages and the sender's own identity for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE", rename_all_fields = "camelCase")]
pub enum WireMessage {
    /// Candidate probe, forwarded along `dir` while `ttl` lasts.
    Out {
        uid: u64,
        phase: u64,
        ttl: u64,
        dir: Direction,
        sender_index: u32,
    },
    /// Acknowledgement reflected from a probe's endpoint back toward the
    /// originator. Travels against `dir`.
    In {
        uid: u64,
        phase: u64,
        dir: Direction,
        sender_index: u32,
    },
    /// Winner notification, relayed one hop at a time along `dir`.
    Announce {
        uid: u64,
        winner: u64,
        dir: Direction,
        sender_index: u32,
    },
    /// Terminal per-node result sent to the orchestrator.
    /// `winner` is [`NO_WINNER`] when the node never learned one.
    Report {
        uid: u64,
        winner: i64,
        rounds: u64,
        messages: u64,
    },
}

impl WireMessage {
    /// Serialize as one newline-terminated JSON line.
    pub fn encode_line(&self) -> Result<String, CodecError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line of JSON. Unknown `"type"` values and malformed bodies
    /// both surface as errors, which receivers treat as a dropped line.
    pub fn parse_line(line: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Ring index of the sending node, if this message kind carries one.
    pub fn sender_index(&self) -> Option<u32> {
        match self {
            WireMessage::Out { sender_index, .. }
            | WireMessage::In { sender_index, .. }
            | WireMessage::Announce { sender_index, .. } => Some(*sender_index),
            WireMessage::Report { .. } => None,
        }
    }
}
