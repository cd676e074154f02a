use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("unknown role: {0} (expected \"client\" or \"server\")")]
    UnknownRole(String),
}
