//! Fundamental types for beacon-bound time-based one-time passwords.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! the shared secret, beacon records, time steps, timestamps, OTP candidates and roles.

pub mod beacon;
pub mod candidate;
pub mod error;
pub mod key;
pub mod role;
pub mod time;

pub use beacon::{BeaconRecord, RANDOMNESS_LEN};
pub use candidate::OtpCandidate;
pub use error::TypesError;
pub use key::SharedKey;
pub use role::Role;
pub use time::{TimeStep, Timestamp};
