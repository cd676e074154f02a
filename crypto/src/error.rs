use thiserror::Error;

/// Errors arising from OTP computation. Always fatal to the derivation they occur in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HotpError {
    #[error("invalid digit count {0}: must be between 1 and 10")]
    InvalidDigits(u32),

    #[error("HMAC key must not be empty")]
    EmptyKey,

    #[error("HMAC initialisation failed: {0}")]
    Mac(String),
}
