//! Access to a public randomness beacon.
//!
//! The OTP derivation only needs two lookups from a beacon: the latest round
//! and a specific historical round. [`BeaconClient`] is that seam; [`drand::DrandClient`]
//! implements it against a drand HTTP relay, and tests substitute a deterministic
//! double.

pub mod drand;
pub mod error;

use std::future::Future;
use std::sync::Arc;

pub use drand::{DrandBeacon, DrandClient};
pub use e2totp_types::BeaconRecord;
pub use error::BeaconError;

/// Source of beacon rounds.
///
/// Implementations are constructed once and reused across derivations.
pub trait BeaconClient: Send + Sync {
    /// Fetch the most recent round.
    fn fetch_latest(&self) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send;

    /// Fetch a specific round. Fails with [`BeaconError::RoundNotFound`] for
    /// round 0 or a round the beacon has not produced yet.
    fn fetch_round(
        &self,
        round: u64,
    ) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send;

    /// Fetch `round`, or the latest round when `None`.
    fn fetch(
        &self,
        round: Option<u64>,
    ) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send {
        async move {
            match round {
                Some(round) => self.fetch_round(round).await,
                None => self.fetch_latest().await,
            }
        }
    }
}

impl<B: BeaconClient> BeaconClient for &B {
    fn fetch_latest(&self) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send {
        (**self).fetch_latest()
    }

    fn fetch_round(
        &self,
        round: u64,
    ) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send {
        (**self).fetch_round(round)
    }
}

impl<B: BeaconClient> BeaconClient for Arc<B> {
    fn fetch_latest(&self) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send {
        self.as_ref().fetch_latest()
    }

    fn fetch_round(
        &self,
        round: u64,
    ) -> impl Future<Output = Result<BeaconRecord, BeaconError>> + Send {
        self.as_ref().fetch_round(round)
    }
}
