//! Nullable infrastructure for deterministic testing.
//!
//! The beacon is the only external dependency of OTP derivation, so it is
//! abstracted behind [`e2totp_beacon::BeaconClient`]. This crate provides a
//! test-friendly implementation that:
//! - Returns deterministic rounds and randomness
//! - Can be told to fail, stall, or advance programmatically
//! - Never touches the network
//!
//! Usage: hand a [`NullBeacon`] to the deriver in place of a `DrandClient`.

pub mod beacon;

pub use beacon::NullBeacon;
