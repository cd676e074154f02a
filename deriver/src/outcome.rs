//! What a derivation produced, and what it could not.

use e2totp_beacon::BeaconError;
use e2totp_types::{OtpCandidate, Role, TimeStep};

use crate::DeriveError;

/// A window round whose beacon fetch failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundFailure {
    pub round: u64,
    pub error: BeaconError,
}

/// Result of one derivation call.
///
/// A client derivation always holds exactly one candidate. A server derivation
/// holds one candidate per window round that could be fetched, ordered from the
/// most recent round down, plus an account of every round that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derivation {
    pub role: Role,
    pub time_step: TimeStep,
    /// Latest round reported by the beacon; the window's anchor.
    pub latest_round: u64,
    /// Window size `n` the parameters asked for (1 for a client).
    pub requested: usize,
    /// Candidates in strictly descending round order.
    pub candidates: Vec<OtpCandidate>,
    /// Rounds whose fetch failed or timed out, descending.
    pub failures: Vec<RoundFailure>,
    /// Rounds still in flight when the derivation was cancelled, descending.
    pub abandoned: Vec<u64>,
    /// The window ran into round 1 before `requested` rounds were covered.
    pub genesis_reached: bool,
}

impl Derivation {
    pub fn candidates(&self) -> &[OtpCandidate] {
        &self.candidates
    }

    /// Number of rounds that produced a candidate.
    pub fn succeeded(&self) -> usize {
        self.candidates.len()
    }

    /// Number of rounds skipped because their fetch failed.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn was_cancelled(&self) -> bool {
        !self.abandoned.is_empty()
    }

    /// Every requested round produced a candidate.
    pub fn is_complete(&self) -> bool {
        self.succeeded() == self.requested
    }

    /// The candidate whose code equals `code`, if any.
    pub fn find(&self, code: u32) -> Option<&OtpCandidate> {
        self.candidates.iter().find(|c| c.code == code)
    }

    /// Apply a minimum-coverage policy to the window.
    ///
    /// Fails with [`DeriveError::WindowExhausted`] when the shortfall comes from
    /// reaching genesis, otherwise with [`DeriveError::InsufficientCoverage`].
    pub fn require_coverage(&self, min: usize) -> Result<(), DeriveError> {
        let succeeded = self.succeeded();
        if succeeded >= min {
            return Ok(());
        }
        if self.genesis_reached && self.failures.is_empty() && self.abandoned.is_empty() {
            return Err(DeriveError::WindowExhausted {
                gathered: succeeded,
                requested: self.requested,
            });
        }
        Err(DeriveError::InsufficientCoverage {
            succeeded,
            requested: self.requested,
            required: min,
        })
    }
}

/// Outcome of checking a submitted code against a server window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    /// The candidate that matched, if any.
    pub matched: Option<OtpCandidate>,
    pub derivation: Derivation,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.matched.is_some()
    }
}
