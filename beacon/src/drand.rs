//! drand: external randomness beacon from the League of Entropy.
//!
//! drand emits publicly verifiable random values at a fixed period. This module
//! provides an HTTP client for a drand relay and decodes its JSON wire form
//! into [`BeaconRecord`]s. Signature verification is left to the relay's
//! consumers; records are used as-is.

use std::time::Duration;

use e2totp_types::{BeaconRecord, RANDOMNESS_LEN};

use crate::{BeaconClient, BeaconError};

/// Default drand mainnet relay URL.
pub const DRAND_MAINNET_URL: &str = "https://api.drand.sh";

/// Chain hash of the drand quicknet network (3 second period, unchained).
pub const DRAND_QUICKNET_CHAIN_HASH: &str =
    "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A drand beacon response as served by the HTTP API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DrandBeacon {
    /// The round number of this beacon.
    pub round: u64,
    /// Hex-encoded randomness value.
    pub randomness: String,
    /// Hex-encoded BLS signature over the round message.
    pub signature: String,
    /// Hex-encoded signature from the previous round (chained scheme only).
    #[serde(default, alias = "previous")]
    pub previous_signature: Option<String>,
}

impl DrandBeacon {
    /// Decode the hex fields into a [`BeaconRecord`].
    ///
    /// Randomness that is not valid hex or not exactly 32 bytes makes the
    /// record unusable, reported as [`BeaconError::Unavailable`].
    pub fn into_record(self) -> Result<BeaconRecord, BeaconError> {
        let bytes = hex::decode(&self.randomness).map_err(|e| {
            BeaconError::Unavailable(format!("round {}: randomness hex: {e}", self.round))
        })?;
        let randomness: [u8; RANDOMNESS_LEN] = bytes.as_slice().try_into().map_err(|_| {
            BeaconError::Unavailable(format!(
                "round {}: randomness is {} bytes, expected {RANDOMNESS_LEN}",
                self.round,
                bytes.len()
            ))
        })?;
        let signature = hex::decode(&self.signature).map_err(|e| {
            BeaconError::Unavailable(format!("round {}: signature hex: {e}", self.round))
        })?;
        let previous = match self.previous_signature.as_deref() {
            Some(prev) if !prev.is_empty() => hex::decode(prev).map_err(|e| {
                BeaconError::Unavailable(format!("round {}: previous hex: {e}", self.round))
            })?,
            _ => Vec::new(),
        };

        Ok(BeaconRecord {
            round: self.round,
            randomness,
            signature,
            previous,
        })
    }
}

/// HTTP client for fetching randomness from a drand relay.
///
/// Holds one `reqwest::Client` for its whole lifetime so connections are
/// pooled across fetches; construct once and share by reference.
pub struct DrandClient {
    /// Base URL of the drand HTTP relay.
    base_url: String,
    /// Reusable HTTP client.
    client: reqwest::Client,
    /// The chain hash identifying which drand network to use (optional filter).
    chain_hash: Option<String>,
    /// Per-request timeout.
    timeout: Duration,
}

impl DrandClient {
    /// Create a new client pointing at the drand mainnet relay.
    pub fn new() -> Self {
        Self::with_url(DRAND_MAINNET_URL)
    }

    /// Create a client pointing at a custom relay URL.
    pub fn with_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            chain_hash: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a client with a specific chain hash for network selection.
    pub fn with_chain(base_url: &str, chain_hash: &str) -> Self {
        Self {
            chain_hash: Some(chain_hash.to_string()),
            ..Self::with_url(base_url)
        }
    }

    /// Create a client for the drand quicknet network on the mainnet relay.
    pub fn quicknet() -> Self {
        Self::with_chain(DRAND_MAINNET_URL, DRAND_QUICKNET_CHAIN_HASH)
    }

    /// Use an existing HTTP client instead of a private one.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the API path prefix, incorporating chain_hash if set.
    fn api_prefix(&self) -> String {
        match &self.chain_hash {
            Some(hash) => format!("{}/{}", self.base_url, hash),
            None => self.base_url.clone(),
        }
    }

    async fn fetch_beacon_from(
        &self,
        url: &str,
        round: Option<u64>,
    ) -> Result<BeaconRecord, BeaconError> {
        tracing::trace!(url, "fetching drand beacon");
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BeaconError::Unavailable(format!("timed out after {:?}: {url}", self.timeout))
                } else {
                    BeaconError::Unavailable(e.to_string())
                }
            })?;

        let status = resp.status();
        if let Some(round) = round {
            // 404 for unknown rounds, 425 Too Early for rounds not yet produced
            if matches!(status.as_u16(), 404 | 425) {
                return Err(BeaconError::RoundNotFound(round));
            }
        }
        if !status.is_success() {
            return Err(BeaconError::Unavailable(format!("HTTP {status} from {url}")));
        }

        let beacon: DrandBeacon = resp
            .json()
            .await
            .map_err(|e| BeaconError::Unavailable(e.to_string()))?;
        beacon.into_record()
    }
}

impl Default for DrandClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BeaconClient for DrandClient {
    async fn fetch_latest(&self) -> Result<BeaconRecord, BeaconError> {
        let url = format!("{}/public/latest", self.api_prefix());
        self.fetch_beacon_from(&url, None).await
    }

    async fn fetch_round(&self, round: u64) -> Result<BeaconRecord, BeaconError> {
        if round == 0 {
            return Err(BeaconError::RoundNotFound(0));
        }
        let url = format!("{}/public/{}", self.api_prefix(), round);
        self.fetch_beacon_from(&url, Some(round)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_randomness_hex() -> String {
        "00".repeat(RANDOMNESS_LEN)
    }

    #[test]
    fn test_default_client_creation() {
        let client = DrandClient::new();
        assert_eq!(client.base_url, DRAND_MAINNET_URL);
        assert!(client.chain_hash.is_none());
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_custom_url_client() {
        let client = DrandClient::with_url("https://custom.drand.sh/");
        assert_eq!(client.base_url, "https://custom.drand.sh");
    }

    #[test]
    fn test_chain_hash_client() {
        let client = DrandClient::with_chain("https://api.drand.sh", "abc123");
        assert_eq!(client.chain_hash.as_deref(), Some("abc123"));
        assert_eq!(client.api_prefix(), "https://api.drand.sh/abc123");
    }

    #[test]
    fn test_quicknet_client_creation() {
        let client = DrandClient::quicknet();
        assert_eq!(client.chain_hash.as_deref(), Some(DRAND_QUICKNET_CHAIN_HASH));
    }

    #[test]
    fn test_with_timeout() {
        let client = DrandClient::new().with_timeout(Duration::from_millis(250));
        assert_eq!(client.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_round_zero_not_found_without_request() {
        // unroutable relay: a request would fail with Unavailable instead
        let client = DrandClient::with_url("http://127.0.0.1:1");
        assert_eq!(client.fetch_round(0).await, Err(BeaconError::RoundNotFound(0)));
    }

    #[test]
    fn test_into_record_decodes_hex() {
        let beacon = DrandBeacon {
            round: 100,
            randomness: "ab".repeat(RANDOMNESS_LEN),
            signature: "deadbeef".into(),
            previous_signature: Some("cafe".into()),
        };
        let record = beacon.into_record().unwrap();
        assert_eq!(record.round, 100);
        assert_eq!(record.randomness, [0xAB; RANDOMNESS_LEN]);
        assert_eq!(record.signature, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(record.previous, vec![0xCA, 0xFE]);
    }

    #[test]
    fn test_into_record_rejects_bad_hex() {
        let beacon = DrandBeacon {
            round: 7,
            randomness: "zz".repeat(RANDOMNESS_LEN),
            signature: String::new(),
            previous_signature: None,
        };
        assert!(matches!(beacon.into_record(), Err(BeaconError::Unavailable(_))));
    }

    #[test]
    fn test_into_record_rejects_short_randomness() {
        let beacon = DrandBeacon {
            round: 7,
            randomness: "00".repeat(16),
            signature: String::new(),
            previous_signature: None,
        };
        match beacon.into_record() {
            Err(BeaconError::Unavailable(msg)) => assert!(msg.contains("16 bytes")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialization_unchained_no_prev_sig() {
        let json = format!(
            r#"{{"round":1000,"randomness":"{}","signature":"ef01"}}"#,
            zero_randomness_hex()
        );
        let beacon: DrandBeacon = serde_json::from_str(&json).unwrap();
        assert_eq!(beacon.round, 1000);
        assert!(beacon.previous_signature.is_none());
        assert!(beacon.into_record().unwrap().previous.is_empty());
    }

    #[test]
    fn test_deserialization_chained_with_prev_sig() {
        let json = r#"{"round":1,"randomness":"ab","signature":"cd","previous_signature":"ef"}"#;
        let beacon: DrandBeacon = serde_json::from_str(json).unwrap();
        assert_eq!(beacon.previous_signature.as_deref(), Some("ef"));
    }

    #[test]
    fn test_deserialization_accepts_previous_alias() {
        let json = r#"{"round":1,"randomness":"ab","signature":"cd","previous":"ef"}"#;
        let beacon: DrandBeacon = serde_json::from_str(json).unwrap();
        assert_eq!(beacon.previous_signature.as_deref(), Some("ef"));
    }
}
