//! Hirschberg-Sinclair election state machine.
//!
//! This crate implements the per-node phase logic of the bidirectional
//! doubling election as a pure, synchronous state machine:
//!
//! ```text
//! inbound message → ElectionState::handle() → actions
//! ```
//!
//! The state machine is:
//! - **Synchronous**: no async, no sockets
//! - **Deterministic**: same state + input = same actions
//! - **Pure-ish**: mutates self, performs no I/O
//!
//! All I/O belongs to the runtime that feeds it messages and executes the
//! [`Action`]s it returns: probe/reflection/announcement sends to a ring
//! neighbor, and the single-shot completion transition. This split keeps the
//! algorithmic heart testable without a network; the integration tests drive
//! whole rings of `ElectionState`s through an in-memory message queue.

mod action;
mod state;

pub use action::Action;
pub use state::ElectionState;
