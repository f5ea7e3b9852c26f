//! Foundation types for the hsring leader-election experiment.
//!
//! This crate provides the shared vocabulary used throughout the workspace:
//!
//! - **Ring geometry**: [`RingPosition`] - index arithmetic and listen ports
//! - **Directions**: [`Direction`] - the L/R label carried by wire messages
//! - **Sides**: [`Side`] - classification of an inbound message's origin
//!
//! # Design Philosophy
//!
//! This crate is self-contained and depends on no other workspace crates,
//! making it the foundation layer. The ring is purely logical: a node knows
//! only its own index and the two port numbers derived from its neighbors'
//! indices.

mod ring;
mod side;

pub use ring::RingPosition;
pub use side::{Direction, Side};
