//! Directional labels for ring traffic.

use serde::{Deserialize, Serialize};

/// Travel direction carried inside wire messages.
///
/// A probe or announcement travels along its direction (`L` toward the left
/// neighbor at each hop); a reflection travels against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    L,
    R,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::L => Direction::R,
            Direction::R => Direction::L,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::L => write!(f, "L"),
            Direction::R => write!(f, "R"),
        }
    }
}

/// Which side of the ring an inbound message arrived from.
///
/// Derived at the listener by comparing the sender's index against the
/// receiver's neighbor indices; a sender matching neither is `Unknown`.
/// Purely diagnostic: protocol handlers route by [`Direction`], never by
/// arrival side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Unknown,
}
