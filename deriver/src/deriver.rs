//! The derivation protocol.
//!
//! Client: fetch the latest round once and bind the code to it.
//!
//! Server: fetch the latest round, then walk back one round at a time over a
//! window of `ceil(step / tolerance)` rounds, deriving a candidate per round
//! with the server's own time step. Round fetches are independent and run
//! concurrently up to `max_concurrent_fetches`; a failed or timed-out fetch
//! skips that round and is reported, never aborting the window.

use std::collections::HashSet;
use std::future::Future;

use e2totp_beacon::{BeaconClient, BeaconError};
use e2totp_crypto::{compute_otp, HotpError};
use e2totp_types::{
    BeaconRecord, OtpCandidate, Role, SharedKey, TimeStep, Timestamp, RANDOMNESS_LEN,
};
use futures_util::stream::{self, StreamExt};

use crate::{DeriveError, DeriveParams, Derivation, RoundFailure, Verification};

/// Length of the HMAC input: 8-byte time step plus the round's randomness.
pub const COUNTER_LEN: usize = 8 + RANDOMNESS_LEN;

/// `BE64(step) || randomness`.
pub fn beacon_counter(step: TimeStep, randomness: &[u8; RANDOMNESS_LEN]) -> [u8; COUNTER_LEN] {
    let mut counter = [0u8; COUNTER_LEN];
    counter[..8].copy_from_slice(&step.to_be_bytes());
    counter[8..].copy_from_slice(randomness);
    counter
}

/// The one code a (key, step, round randomness) triple determines.
pub fn otp_for_round(
    key: &SharedKey,
    step: TimeStep,
    record: &BeaconRecord,
    digits: u32,
) -> Result<OtpCandidate, HotpError> {
    let counter = beacon_counter(step, &record.randomness);
    let code = compute_otp(key.as_bytes(), &counter, digits)?;
    Ok(OtpCandidate::new(record.round, code))
}

/// Derives beacon-bound OTPs for either side of the exchange.
///
/// Owns the injected beacon client for its whole lifetime; pass `&client` or an
/// `Arc` to share one client between derivers.
pub struct E2TotpDeriver<B> {
    beacon: B,
    key: SharedKey,
    params: DeriveParams,
}

impl<B: BeaconClient> E2TotpDeriver<B> {
    /// Validates the parameters and the key up front so no beacon traffic is
    /// spent on a derivation that cannot succeed.
    pub fn new(beacon: B, key: SharedKey, params: DeriveParams) -> Result<Self, DeriveError> {
        params.validate()?;
        if key.is_empty() {
            return Err(HotpError::EmptyKey.into());
        }
        if params.tolerance_secs > params.step_secs {
            tracing::warn!(
                tolerance_secs = params.tolerance_secs,
                step_secs = params.step_secs,
                "skew tolerance exceeds step duration, server window is a single round"
            );
        }
        Ok(Self {
            beacon,
            key,
            params,
        })
    }

    pub fn params(&self) -> &DeriveParams {
        &self.params
    }

    pub fn time_step(&self, now: Timestamp) -> Result<TimeStep, DeriveError> {
        self.params.time_step(now)
    }

    /// Derive for `role` at `now`.
    pub async fn derive(&self, role: Role, now: Timestamp) -> Result<Derivation, DeriveError> {
        match role {
            Role::Client => {
                let time_step = self.time_step(now)?;
                let candidate = self.client_candidate(time_step).await?;
                Ok(Derivation {
                    role,
                    time_step,
                    latest_round: candidate.source_round,
                    requested: 1,
                    candidates: vec![candidate],
                    failures: Vec::new(),
                    abandoned: Vec::new(),
                    genesis_reached: false,
                })
            }
            Role::Server => self.derive_server(now).await,
        }
    }

    /// The client's single code, bound to the beacon's latest round.
    ///
    /// A beacon failure is fatal here; there is no partial result.
    pub async fn derive_client(&self, now: Timestamp) -> Result<OtpCandidate, DeriveError> {
        let time_step = self.time_step(now)?;
        self.client_candidate(time_step).await
    }

    async fn client_candidate(&self, time_step: TimeStep) -> Result<OtpCandidate, DeriveError> {
        let record = self.fetch_timed(None).await?;
        let candidate = otp_for_round(&self.key, time_step, &record, self.params.digits)?;
        tracing::debug!(step = %time_step, round = record.round, "derived client OTP");
        Ok(candidate)
    }

    /// The server's candidate window at `now`.
    pub async fn derive_server(&self, now: Timestamp) -> Result<Derivation, DeriveError> {
        self.derive_server_until(now, std::future::pending::<()>())
            .await
    }

    /// The server's candidate window, abandoning outstanding fetches once
    /// `cancel` resolves.
    ///
    /// Only the initial latest-round fetch is fatal. Afterwards every round
    /// either yields a candidate, lands in `failures`, or, when cancelled,
    /// lands in `abandoned`.
    pub async fn derive_server_until<F>(
        &self,
        now: Timestamp,
        cancel: F,
    ) -> Result<Derivation, DeriveError>
    where
        F: Future<Output = ()>,
    {
        let time_step = self.time_step(now)?;
        let latest = self.fetch_timed(None).await?;
        let requested = self.params.window_size();

        let rounds: Vec<u64> = (0..requested as u64)
            .map_while(|i| latest.round.checked_sub(i).filter(|r| *r >= 1))
            .collect();
        let genesis_reached = rounds.len() < requested;

        tracing::debug!(
            step = %time_step,
            latest = latest.round,
            requested,
            planned = rounds.len(),
            "deriving server window"
        );

        tokio::pin!(cancel);
        // dropping the stream at the end of this block abandons in-flight fetches
        let completed = {
            let fetches = stream::iter(rounds.iter().copied())
                .map(|round| async move { (round, self.fetch_timed(Some(round)).await) })
                .buffer_unordered(self.params.max_concurrent_fetches);
            tokio::pin!(fetches);

            let mut completed = Vec::with_capacity(rounds.len());
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel => {
                        tracing::debug!(completed = completed.len(), "server window cancelled");
                        break;
                    }
                    next = fetches.next() => match next {
                        Some(result) => completed.push(result),
                        None => break,
                    },
                }
            }
            completed
        };

        let mut candidates = Vec::with_capacity(completed.len());
        let mut failures = Vec::new();
        let mut done = HashSet::with_capacity(completed.len());
        for (round, result) in completed {
            done.insert(round);
            let record = match result {
                Ok(record) if record.round == round => record,
                Ok(record) => {
                    let error = BeaconError::Unavailable(format!(
                        "requested round {round}, beacon returned round {}",
                        record.round
                    ));
                    tracing::warn!(round, %error, "skipping window round");
                    failures.push(RoundFailure { round, error });
                    continue;
                }
                Err(error) => {
                    tracing::warn!(round, %error, "skipping window round");
                    failures.push(RoundFailure { round, error });
                    continue;
                }
            };
            candidates.push(otp_for_round(
                &self.key,
                time_step,
                &record,
                self.params.digits,
            )?);
        }

        candidates.sort_by(|a, b| b.source_round.cmp(&a.source_round));
        failures.sort_by(|a, b| b.round.cmp(&a.round));
        let abandoned: Vec<u64> = rounds.into_iter().filter(|r| !done.contains(r)).collect();

        if genesis_reached {
            tracing::debug!(
                requested,
                available = latest.round,
                "window reached genesis round"
            );
        }

        Ok(Derivation {
            role: Role::Server,
            time_step,
            latest_round: latest.round,
            requested,
            candidates,
            failures,
            abandoned,
            genesis_reached,
        })
    }

    /// Check a client-submitted code against the server window at `now`.
    pub async fn verify(&self, code: u32, now: Timestamp) -> Result<Verification, DeriveError> {
        let derivation = self.derive_server(now).await?;
        let matched = derivation.find(code).copied();
        tracing::debug!(
            matched = matched.is_some(),
            succeeded = derivation.succeeded(),
            failures = derivation.failure_count(),
            "verified submitted OTP"
        );
        Ok(Verification {
            matched,
            derivation,
        })
    }

    /// One beacon fetch under the configured timeout.
    async fn fetch_timed(&self, round: Option<u64>) -> Result<BeaconRecord, BeaconError> {
        let timeout = self.params.fetch_timeout;
        match tokio::time::timeout(timeout, self.beacon.fetch(round)).await {
            Ok(result) => result,
            Err(_) => Err(BeaconError::Unavailable(match round {
                Some(round) => format!("round {round}: timed out after {timeout:?}"),
                None => format!("latest round: timed out after {timeout:?}"),
            })),
        }
    }
}
