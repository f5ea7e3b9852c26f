//! The per-node election state machine.

use crate::Action;
use hsring_messages::WireMessage;
use hsring_types::{Direction, RingPosition, Side};
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

/// Acknowledgement bits for one phase's pair of probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct AckState {
    left: bool,
    right: bool,
}

impl AckState {
    fn both(&self) -> bool {
        self.left && self.right
    }
}

/// Election state for one node.
///
/// Drives the bidirectional doubling election: in phase `p` a still-active
/// candidate probes `2^p` hops in each direction and waits for both
/// reflections to return. A candidate that sees its own probe come all the
/// way around the ring has won.
///
/// # State Machine Flow
///
/// 1. **Phase start** → emit one probe per direction, track ack bits
/// 2. **Probe received** → swallow, forward, or reflect, by UID and TTL
/// 3. **Reflection received** → relay toward its originator, or record ack
/// 4. **Both acks** → advance to the next phase (doubled distance)
/// 5. **Own probe returned** → victory: announce both ways, complete
/// 6. **Announcement received** → learn winner, relay one hop, complete
pub struct ElectionState {
    /// This node's identity; the election picks the largest one on the ring.
    uid: u64,

    /// Where this node sits on the ring.
    position: RingPosition,

    /// Current phase, monotonically non-decreasing from 0.
    phase: u64,

    /// Cleared on phase timeout; a deactivated node emits no further probes.
    active: bool,

    /// Set exactly once, either by self-recognition or by an announcement.
    winner: Option<u64>,

    /// Ack bits per phase. Entries are created when a phase's probes go out
    /// and dropped once the phase completes; late reflections for a
    /// finished phase recreate a (harmless) stale entry.
    phase_acks: HashMap<u64, AckState>,

    /// High-water round count for the final report: the last phase reached,
    /// or the victory round on the winning node.
    rounds: u64,
}

impl ElectionState {
    pub fn new(uid: u64, position: RingPosition) -> Self {
        Self {
            uid,
            position,
            phase: 0,
            active: true,
            winner: None,
            phase_acks: HashMap::new(),
            rounds: 0,
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn phase(&self) -> u64 {
        self.phase
    }

    pub fn winner(&self) -> Option<u64> {
        self.winner
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Start the current phase: create its ack entry and emit the two
    /// probes, one per direction, with TTL `2^phase`.
    ///
    /// Emits nothing once a winner is known or after deactivation.
    pub fn begin_phase(&mut self) -> Vec<Action> {
        if self.winner.is_some() || !self.active {
            return Vec::new();
        }
        let distance = 1u64 << self.phase;
        self.phase_acks.insert(self.phase, AckState::default());
        debug!(phase = self.phase, distance, "starting phase");
        [Direction::L, Direction::R]
            .into_iter()
            .map(|dir| Action::Send {
                to: dir,
                message: WireMessage::Out {
                    uid: self.uid,
                    phase: self.phase,
                    ttl: distance,
                    dir,
                    sender_index: self.position.index(),
                },
            })
            .collect()
    }

    /// Whether both reflections for the current phase have returned.
    pub fn phase_acked(&self) -> bool {
        self.phase_acks
            .get(&self.phase)
            .is_some_and(AckState::both)
    }

    /// Move to the next phase after both acks arrived, raising the
    /// high-water round count.
    pub fn advance_phase(&mut self) {
        self.phase_acks.remove(&self.phase);
        self.phase += 1;
        self.rounds = self.rounds.max(self.phase);
        trace!(phase = self.phase, "phase advanced");
    }

    /// Phase-timeout transition: stop probing. Diagnostic only - the
    /// scenario is already failing when this fires.
    pub fn deactivate(&mut self) {
        self.active = false;
        warn!(phase = self.phase, "deactivated after phase timeout");
    }

    /// Process one inbound message and return the resulting actions.
    ///
    /// The arrival side is diagnostic; routing decisions use the direction
    /// carried in the message itself.
    pub fn handle(&mut self, message: WireMessage, side: Side) -> Vec<Action> {
        if side == Side::Unknown {
            warn!(?message, "message from outside the ring neighborhood");
        }
        match message {
            WireMessage::Out {
                uid,
                phase,
                ttl,
                dir,
                ..
            } => self.handle_probe(uid, phase, ttl, dir),
            WireMessage::In {
                uid, phase, dir, ..
            } => self.handle_reflection(uid, phase, dir),
            WireMessage::Announce { winner, dir, .. } => self.handle_announce(winner, dir),
            WireMessage::Report { .. } => {
                warn!("report received on a ring port, dropping");
                Vec::new()
            }
        }
    }

    fn handle_probe(&mut self, uid: u64, phase: u64, ttl: u64, dir: Direction) -> Vec<Action> {
        if uid < self.uid {
            trace!(probe_uid = uid, "swallowing smaller probe");
            return Vec::new();
        }
        if uid == self.uid {
            // Our own probe has gone all the way around the ring: nothing
            // larger exists, so this node has won.
            return self.victory(phase);
        }
        if ttl > 1 {
            trace!(probe_uid = uid, phase, ttl, %dir, "forwarding probe");
            vec![Action::Send {
                to: dir,
                message: WireMessage::Out {
                    uid,
                    phase,
                    ttl: ttl - 1,
                    dir,
                    sender_index: self.position.index(),
                },
            }]
        } else {
            // TTL exhausted here: reflect an acknowledgement back toward the
            // originator, against the probe's direction.
            trace!(probe_uid = uid, phase, %dir, "reflecting probe");
            vec![Action::Send {
                to: dir.opposite(),
                message: WireMessage::In {
                    uid,
                    phase,
                    dir,
                    sender_index: self.position.index(),
                },
            }]
        }
    }

    fn handle_reflection(&mut self, uid: u64, phase: u64, dir: Direction) -> Vec<Action> {
        if uid != self.uid {
            // Another candidate's acknowledgement passing through on its way
            // back; keep it moving against its probe's direction.
            return vec![Action::Send {
                to: dir.opposite(),
                message: WireMessage::In {
                    uid,
                    phase,
                    dir,
                    sender_index: self.position.index(),
                },
            }];
        }
        let acks = self.phase_acks.entry(phase).or_default();
        match dir {
            Direction::L => acks.left = true,
            Direction::R => acks.right = true,
        }
        trace!(phase, %dir, "acknowledgement recorded");
        Vec::new()
    }

    fn victory(&mut self, probe_phase: u64) -> Vec<Action> {
        if self.winner.is_some() {
            return Vec::new();
        }
        self.winner = Some(self.uid);
        self.rounds = self.rounds.max(probe_phase + 1);
        info!(uid = self.uid, rounds = self.rounds, "own probe returned, election won");
        let mut actions: Vec<Action> = [Direction::L, Direction::R]
            .into_iter()
            .map(|dir| Action::Send {
                to: dir,
                message: WireMessage::Announce {
                    uid: self.uid,
                    winner: self.uid,
                    dir,
                    sender_index: self.position.index(),
                },
            })
            .collect();
        actions.push(Action::Complete);
        actions
    }

    fn handle_announce(&mut self, winner: u64, dir: Direction) -> Vec<Action> {
        match self.winner {
            None => {
                self.winner = Some(winner);
                info!(winner, "winner learned from announcement");
            }
            Some(known) if known != winner => {
                // Never overwritten; two winners on one ring means the run
                // is already broken and the orchestrator will catch it.
                warn!(known, announced = winner, "conflicting winner announced");
            }
            Some(_) => {}
        }
        // Relay one hop further in the same direction before completing, so
        // the wave keeps moving even though this node is about to stop.
        vec![
            Action::Send {
                to: dir,
                message: WireMessage::Announce {
                    uid: self.uid,
                    winner,
                    dir,
                    sender_index: self.position.index(),
                },
            },
            Action::Complete,
        ]
    }
}

impl std::fmt::Debug for ElectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElectionState")
            .field("uid", &self.uid)
            .field("index", &self.position.index())
            .field("phase", &self.phase)
            .field("active", &self.active)
            .field("winner", &self.winner)
            .field("rounds", &self.rounds)
            .finish()
    }
}
