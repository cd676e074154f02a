//! Nullable beacon: deterministic rounds without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use e2totp_beacon::{BeaconClient, BeaconError};
use e2totp_types::{BeaconRecord, RANDOMNESS_LEN};

/// How a round's randomness is chosen.
enum RandomnessSource {
    /// Every round shares one value.
    Constant([u8; RANDOMNESS_LEN]),
    /// Each round's randomness is its big-endian number repeated across 32 bytes.
    PerRound,
}

/// A deterministic beacon for testing.
///
/// Serves rounds `1..=latest`. Rounds can be marked failing (Unavailable) or
/// slow (delayed before answering), and the latest round can be advanced.
/// Fetch counts and peak concurrency are recorded for assertions.
pub struct NullBeacon {
    latest: Mutex<u64>,
    source: RandomnessSource,
    overrides: Mutex<HashMap<u64, [u8; RANDOMNESS_LEN]>>,
    failing: Mutex<HashSet<u64>>,
    latest_unavailable: Mutex<bool>,
    slow: Mutex<HashMap<u64, Duration>>,
    delay: Mutex<Option<Duration>>,
    latest_calls: AtomicUsize,
    round_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl NullBeacon {
    fn with_source(latest: u64, source: RandomnessSource) -> Self {
        Self {
            latest: Mutex::new(latest),
            source,
            overrides: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            latest_unavailable: Mutex::new(false),
            slow: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            latest_calls: AtomicUsize::new(0),
            round_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every round up to `latest` returns the same randomness.
    pub fn constant(latest: u64, randomness: [u8; RANDOMNESS_LEN]) -> Self {
        Self::with_source(latest, RandomnessSource::Constant(randomness))
    }

    /// Every round up to `latest` returns randomness unique to that round.
    pub fn sequential(latest: u64) -> Self {
        Self::with_source(latest, RandomnessSource::PerRound)
    }

    /// The randomness `sequential` assigns to `round`.
    pub fn sequential_randomness(round: u64) -> [u8; RANDOMNESS_LEN] {
        let mut out = [0u8; RANDOMNESS_LEN];
        for chunk in out.chunks_mut(8) {
            chunk.copy_from_slice(&round.to_be_bytes());
        }
        out
    }

    /// Make fetches of these rounds fail with `Unavailable`.
    pub fn with_failing_rounds(self, rounds: impl IntoIterator<Item = u64>) -> Self {
        self.failing.lock().unwrap().extend(rounds);
        self
    }

    /// Delay answers for these rounds.
    pub fn with_slow_rounds(self, rounds: impl IntoIterator<Item = u64>, delay: Duration) -> Self {
        self.slow
            .lock()
            .unwrap()
            .extend(rounds.into_iter().map(|r| (r, delay)));
        self
    }

    /// Delay every round fetch.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Make `fetch_latest` fail with `Unavailable`.
    pub fn with_latest_unavailable(self) -> Self {
        *self.latest_unavailable.lock().unwrap() = true;
        self
    }

    /// Replace the randomness served for one round.
    pub fn set_randomness(&self, round: u64, randomness: [u8; RANDOMNESS_LEN]) {
        self.overrides.lock().unwrap().insert(round, randomness);
    }

    /// Move the latest round forward (or back).
    pub fn set_latest(&self, round: u64) {
        *self.latest.lock().unwrap() = round;
    }

    pub fn latest_round(&self) -> u64 {
        *self.latest.lock().unwrap()
    }

    /// Number of `fetch_latest` calls so far.
    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_round` calls so far.
    pub fn round_calls(&self) -> usize {
        self.round_calls.load(Ordering::SeqCst)
    }

    /// Highest number of round fetches observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, round: u64) -> BeaconRecord {
        let randomness = match self.overrides.lock().unwrap().get(&round) {
            Some(r) => *r,
            None => match self.source {
                RandomnessSource::Constant(r) => r,
                RandomnessSource::PerRound => Self::sequential_randomness(round),
            },
        };
        BeaconRecord {
            round,
            randomness,
            signature: round.to_be_bytes().to_vec(),
            previous: round.saturating_sub(1).to_be_bytes().to_vec(),
        }
    }

    fn round_delay(&self, round: u64) -> Option<Duration> {
        let slow = self.slow.lock().unwrap().get(&round).copied();
        slow.or(*self.delay.lock().unwrap())
    }
}

/// Decrements the in-flight counter even when the fetch future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BeaconClient for NullBeacon {
    async fn fetch_latest(&self) -> Result<BeaconRecord, BeaconError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        if *self.latest_unavailable.lock().unwrap() {
            return Err(BeaconError::Unavailable("null beacon: latest unavailable".into()));
        }
        let latest = self.latest_round();
        if latest == 0 {
            return Err(BeaconError::Unavailable("null beacon: no rounds yet".into()));
        }
        Ok(self.record(latest))
    }

    async fn fetch_round(&self, round: u64) -> Result<BeaconRecord, BeaconError> {
        self.round_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.round_delay(round) {
            tokio::time::sleep(delay).await;
        }

        if round == 0 || round > self.latest_round() {
            return Err(BeaconError::RoundNotFound(round));
        }
        if self.failing.lock().unwrap().contains(&round) {
            return Err(BeaconError::Unavailable(format!(
                "null beacon: round {round} failing"
            )));
        }
        Ok(self.record(round))
    }
}
