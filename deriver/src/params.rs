//! Derivation parameters shared by client and server.

use std::time::Duration;

use e2totp_crypto::{HotpError, DEFAULT_DIGITS, MAX_DIGITS, MIN_DIGITS};
use e2totp_types::{TimeStep, Timestamp};

use crate::DeriveError;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// Time quantization, skew tolerance and fetch limits.
///
/// Client and server must agree on `epoch`, `step_secs` and `digits`;
/// `tolerance_secs` and the fetch limits only matter to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeriveParams {
    /// Reference epoch `T0`.
    pub epoch: Timestamp,
    /// Seconds per time step `X`.
    pub step_secs: u64,
    /// Server's assumed clock/network skew `delta`.
    pub tolerance_secs: u64,
    /// Decimal digits per code.
    pub digits: u32,
    /// Per-fetch timeout; an expired fetch counts as an unavailable round.
    pub fetch_timeout: Duration,
    /// Upper bound on concurrent round fetches in a server window.
    pub max_concurrent_fetches: usize,
}

impl DeriveParams {
    pub fn new(epoch: u64, step_secs: u64, tolerance_secs: u64) -> Self {
        Self {
            epoch: Timestamp::new(epoch),
            step_secs,
            tolerance_secs,
            digits: DEFAULT_DIGITS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    pub fn validate(&self) -> Result<(), DeriveError> {
        if self.step_secs == 0 {
            return Err(DeriveError::InvalidStepDuration);
        }
        if self.tolerance_secs == 0 {
            return Err(DeriveError::InvalidTolerance);
        }
        if self.max_concurrent_fetches == 0 {
            return Err(DeriveError::InvalidConcurrency);
        }
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&self.digits) {
            return Err(HotpError::InvalidDigits(self.digits).into());
        }
        Ok(())
    }

    /// Number of rounds in a server window: `ceil(step / tolerance)`, at least 1.
    pub fn window_size(&self) -> usize {
        let n = self.step_secs.div_ceil(self.tolerance_secs.max(1)).max(1);
        usize::try_from(n).unwrap_or(usize::MAX)
    }

    /// `floor((now - epoch) / step)`.
    pub fn time_step(&self, now: Timestamp) -> Result<TimeStep, DeriveError> {
        if self.step_secs == 0 {
            return Err(DeriveError::InvalidStepDuration);
        }
        TimeStep::at(self.epoch, now, self.step_secs).ok_or(DeriveError::InvalidEpoch {
            current: now.as_secs(),
            epoch: self.epoch.as_secs(),
        })
    }
}

impl Default for DeriveParams {
    fn default() -> Self {
        Self::new(0, 60, 30)
    }
}
