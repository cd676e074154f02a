use serde::{Deserialize, Serialize};
use std::fmt;

/// An OTP value together with the beacon round it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OtpCandidate {
    pub source_round: u64,
    pub code: u32,
}

impl OtpCandidate {
    pub fn new(source_round: u64, code: u32) -> Self {
        Self { source_round, code }
    }
}

impl fmt::Display for OtpCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source_round, self.code)
    }
}
