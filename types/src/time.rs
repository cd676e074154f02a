//! Timestamps and time steps.
//!
//! Timestamps are Unix epoch seconds (UTC). A time step quantizes the seconds
//! elapsed since a reference epoch into fixed-duration windows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// `floor((now - epoch) / step)`, the counter half of the HMAC input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeStep(u64);

impl TimeStep {
    pub fn new(step: u64) -> Self {
        Self(step)
    }

    /// Quantize `now` into steps of `step_secs` since `epoch`.
    ///
    /// Returns `None` when `now` precedes `epoch` or `step_secs` is zero.
    pub fn at(epoch: Timestamp, now: Timestamp, step_secs: u64) -> Option<Self> {
        if step_secs == 0 {
            return None;
        }
        let elapsed = now.0.checked_sub(epoch.0)?;
        Some(Self(elapsed / step_secs))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 8-byte big-endian encoding used as the HMAC counter prefix.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Seconds left in this step at `now`.
    pub fn seconds_remaining(&self, epoch: Timestamp, now: Timestamp, step_secs: u64) -> u64 {
        let end = epoch
            .0
            .saturating_add(self.0.saturating_add(1).saturating_mul(step_secs));
        end.saturating_sub(now.0)
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
