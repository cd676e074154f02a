//! Randomness beacon records.

use serde::{Deserialize, Serialize};

/// Length of a beacon round's randomness output (SHA-256 of the round signature).
pub const RANDOMNESS_LEN: usize = 32;

/// One round of public randomness as published by a beacon.
///
/// Records are only ever produced by a beacon client and never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRecord {
    /// Round number, starting at 1 for the genesis round.
    pub round: u64,
    /// The round's 32-byte randomness.
    pub randomness: [u8; RANDOMNESS_LEN],
    /// The beacon's signature over this round.
    pub signature: Vec<u8>,
    /// Signature of the previous round (empty for unchained beacons).
    pub previous: Vec<u8>,
}

impl BeaconRecord {
    /// Build a record carrying only a round and its randomness.
    pub fn new(round: u64, randomness: [u8; RANDOMNESS_LEN]) -> Self {
        Self {
            round,
            randomness,
            signature: Vec::new(),
            previous: Vec::new(),
        }
    }
}
