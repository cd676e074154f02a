use e2totp_beacon::BeaconError;
use e2totp_crypto::HotpError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("current time {current} precedes epoch {epoch}")]
    InvalidEpoch { current: u64, epoch: u64 },

    #[error("step duration must be positive")]
    InvalidStepDuration,

    #[error("skew tolerance must be positive")]
    InvalidTolerance,

    #[error("max concurrent beacon fetches must be positive")]
    InvalidConcurrency,

    #[error("OTP computation failed: {0}")]
    Hotp(#[from] HotpError),

    #[error("beacon error: {0}")]
    Beacon(#[from] BeaconError),

    #[error("window exhausted at genesis: only {gathered} of {requested} rounds exist")]
    WindowExhausted { gathered: usize, requested: usize },

    #[error("insufficient coverage: {succeeded} of {requested} rounds succeeded, {required} required")]
    InsufficientCoverage {
        succeeded: usize,
        requested: usize,
        required: usize,
    },

    #[error("config error: {0}")]
    Config(String),
}
