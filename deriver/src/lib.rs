//! End-to-end beacon-bound TOTP derivation.
//!
//! An OTP is `HOTP(key, BE64(time_step) || beacon_randomness)`. The client binds
//! its code to the beacon's latest round; the server, not knowing which round
//! the client observed, enumerates a window of recent rounds and collects one
//! candidate per round.
//!
//! The beacon is injected through [`e2totp_beacon::BeaconClient`], so the whole
//! protocol runs against a deterministic double in tests.

pub mod config;
pub mod deriver;
pub mod error;
pub mod outcome;
pub mod params;

pub use config::E2TotpConfig;
pub use deriver::{beacon_counter, otp_for_round, E2TotpDeriver};
pub use error::DeriveError;
pub use outcome::{Derivation, RoundFailure, Verification};
pub use params::DeriveParams;
