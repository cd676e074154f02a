//! Derivation configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use e2totp_beacon::DrandClient;

use crate::{DeriveError, DeriveParams};

/// Configuration for deriving beacon-bound OTPs.
///
/// Can be loaded from a TOML file via [`E2TotpConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct E2TotpConfig {
    /// Reference epoch in Unix seconds.
    #[serde(default)]
    pub epoch: u64,

    /// Seconds per time step.
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,

    /// Server's assumed clock/network skew in seconds.
    #[serde(default = "default_tolerance_secs")]
    pub tolerance_secs: u64,

    /// Decimal digits per code.
    #[serde(default = "default_digits")]
    pub digits: u32,

    /// Per-fetch beacon timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Concurrent beacon fetches while enumerating a server window.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// drand relay base URL.
    #[serde(default = "default_beacon_url")]
    pub beacon_url: String,

    /// Optional drand chain hash selecting a network on the relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_hash: Option<String>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_step_secs() -> u64 {
    60
}

fn default_tolerance_secs() -> u64 {
    30
}

fn default_digits() -> u32 {
    e2totp_crypto::DEFAULT_DIGITS
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent_fetches() -> usize {
    crate::params::DEFAULT_MAX_CONCURRENT_FETCHES
}

fn default_beacon_url() -> String {
    e2totp_beacon::drand::DRAND_MAINNET_URL.to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl E2TotpConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DeriveError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DeriveError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DeriveError> {
        toml::from_str(s).map_err(|e| DeriveError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("E2TotpConfig is always serializable to TOML")
    }

    /// Derivation parameters, validated.
    pub fn to_params(&self) -> Result<DeriveParams, DeriveError> {
        let params = DeriveParams::new(self.epoch, self.step_secs, self.tolerance_secs)
            .with_digits(self.digits)
            .with_fetch_timeout(Duration::from_millis(self.fetch_timeout_ms))
            .with_max_concurrent_fetches(self.max_concurrent_fetches);
        params.validate()?;
        Ok(params)
    }

    /// A drand client for the configured relay and chain.
    pub fn beacon_client(&self) -> DrandClient {
        let client = match &self.chain_hash {
            Some(hash) => DrandClient::with_chain(&self.beacon_url, hash),
            None => DrandClient::with_url(&self.beacon_url),
        };
        client.with_timeout(Duration::from_millis(self.fetch_timeout_ms))
    }
}

impl Default for E2TotpConfig {
    fn default() -> Self {
        Self {
            epoch: 0,
            step_secs: default_step_secs(),
            tolerance_secs: default_tolerance_secs(),
            digits: default_digits(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            beacon_url: default_beacon_url(),
            chain_hash: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
