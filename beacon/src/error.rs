use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// Network failure, timeout, or a malformed record.
    #[error("beacon unavailable: {0}")]
    Unavailable(String),

    #[error("beacon round {0} not found")]
    RoundNotFound(u64),
}
