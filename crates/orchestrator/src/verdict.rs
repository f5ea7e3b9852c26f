//! Scenario validation and aggregation.

use crate::NodeReport;
use hsring_messages::NO_WINNER;
use tracing::error;

/// The four predicates a scenario must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// One report per node arrived before the deadline.
    pub got_all_reports: bool,
    /// Every child exited on its own with status 0.
    pub all_exited: bool,
    /// All collected reports agree on the winner.
    pub same_winner: bool,
    /// The agreed winner is the largest expected UID.
    pub winner_is_expected: bool,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.got_all_reports && self.all_exited && self.same_winner && self.winner_is_expected
    }
}

/// Everything the orchestrator knows about a finished scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub n: u32,
    pub expected_uids: Vec<u64>,
    pub reports: Vec<NodeReport>,
    pub verdict: Verdict,
    /// The agreed winner, or [`NO_WINNER`] when reports disagree or are
    /// absent.
    pub winner: i64,
    /// The winning node's reported round count, falling back to the
    /// maximum across reports.
    pub rounds: u64,
    /// Sum of every node's delivered protocol messages.
    pub total_messages: u64,
}

impl ScenarioOutcome {
    /// Validate collected reports against the spawned ring.
    pub fn evaluate(
        n: u32,
        expected_uids: Vec<u64>,
        reports: Vec<NodeReport>,
        all_exited: bool,
    ) -> Self {
        let got_all_reports = reports.len() == n as usize;

        let same_winner = match reports.split_first() {
            None => false,
            Some((first, rest)) => rest.iter().all(|r| r.winner == first.winner),
        };
        let winner = if same_winner {
            reports[0].winner
        } else {
            NO_WINNER
        };

        // The election only means anything if the identities were unique to
        // begin with; pids of live sibling processes always are, so a
        // collision here is a harness bug.
        let mut sorted = expected_uids.clone();
        sorted.sort_unstable();
        let uids_unique = sorted.windows(2).all(|pair| pair[0] != pair[1]);
        if !uids_unique {
            error!(?expected_uids, "duplicate expected UIDs");
        }

        let expected_winner = expected_uids.iter().max().copied();
        let winner_is_expected = same_winner
            && uids_unique
            && expected_winner.is_some_and(|expected| winner == expected as i64);

        let total_messages = reports.iter().map(|r| r.messages).sum();
        let rounds = reports
            .iter()
            .find(|r| i64::try_from(r.uid) == Ok(winner))
            .map(|r| r.rounds)
            .unwrap_or_else(|| reports.iter().map(|r| r.rounds).max().unwrap_or(0));

        Self {
            n,
            expected_uids,
            reports,
            verdict: Verdict {
                got_all_reports,
                all_exited,
                same_winner,
                winner_is_expected,
            },
            winner,
            rounds,
            total_messages,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }

    /// The per-scenario console block.
    pub fn print_block(&self) {
        println!("N={}", self.n);
        println!("UIDs={:?}", self.expected_uids);
        println!("WinnerUID={}", self.winner);
        println!("Rounds={}", self.rounds);
        println!("TotalMessages={}", self.total_messages);
        println!(
            "SelfCheck={}",
            if self.passed() { "PASS" } else { "FAIL" }
        );
    }
}
