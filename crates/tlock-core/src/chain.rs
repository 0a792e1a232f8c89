//! Beacon chain metadata and the client interface the timelock layer consumes.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::debug;

use tlock_crypto::{GroupPoint, SchemeId};

use crate::error::{Result, TlockError};

// ============================================================================
// ChainInfo / Beacon
// ============================================================================

/// Immutable metadata describing a beacon chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    /// Chain hash, the chain's stable identifier.
    pub hash: Vec<u8>,
    /// Compressed public key, in the group selected by `scheme`.
    pub public_key: Vec<u8>,
    /// Seconds between rounds.
    pub period: u64,
    /// Unix seconds at which round 1 was emitted.
    pub genesis_time: u64,
    pub scheme: SchemeId,
    pub beacon_id: String,
}

#[derive(Deserialize)]
struct ChainInfoJson {
    public_key: String,
    period: u64,
    genesis_time: u64,
    hash: String,
    #[serde(rename = "schemeID")]
    scheme_id: String,
    #[serde(default)]
    metadata: Option<ChainMetadataJson>,
}

#[derive(Deserialize)]
struct ChainMetadataJson {
    #[serde(rename = "beaconID")]
    beacon_id: String,
}

impl ChainInfo {
    /// Parse the `/info` JSON document served by a beacon node.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: ChainInfoJson = serde_json::from_str(json)
            .map_err(|e| TlockError::InvalidChainInfo(e.to_string()))?;
        let info = Self {
            hash: decode_hex("hash", &raw.hash)?,
            public_key: decode_hex("public_key", &raw.public_key)?,
            period: raw.period,
            genesis_time: raw.genesis_time,
            scheme: raw
                .scheme_id
                .parse()
                .map_err(|_| TlockError::UnsupportedScheme(raw.scheme_id.clone()))?,
            beacon_id: raw.metadata.map(|m| m.beacon_id).unwrap_or_default(),
        };
        info.validate()?;
        Ok(info)
    }

    /// Check the fields the round arithmetic and IBE rely on.
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(TlockError::InvalidChainInfo("period must be positive".into()));
        }
        let expected = self.scheme.public_key_group().point_size();
        if self.public_key.len() != expected {
            return Err(TlockError::InvalidChainInfo(format!(
                "public key for {} must be {expected} bytes, got {}",
                self.scheme,
                self.public_key.len()
            )));
        }
        GroupPoint::from_compressed(self.scheme.public_key_group(), &self.public_key)
            .map_err(|e| TlockError::InvalidChainInfo(format!("public key: {e}")))?;
        Ok(())
    }

    /// Chain hash as lowercase hex, the form carried in stanzas.
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

/// One published beacon round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub round: u64,
    pub signature: Vec<u8>,
    /// `SHA-256(signature)` when the node reports it.
    pub randomness: Option<Vec<u8>>,
}

#[derive(Deserialize)]
struct BeaconJson {
    round: u64,
    signature: String,
    #[serde(default)]
    randomness: Option<String>,
}

impl Beacon {
    /// Parse a `/public/<round>` JSON document and check its randomness.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BeaconJson = serde_json::from_str(json).map_err(|e| TlockError::ChainClient {
            message: format!("invalid beacon JSON: {e}"),
            retryable: false,
        })?;
        let beacon = Self {
            round: raw.round,
            signature: decode_beacon_hex("signature", &raw.signature)?,
            randomness: raw
                .randomness
                .as_deref()
                .map(|r| decode_beacon_hex("randomness", r))
                .transpose()?,
        };
        beacon.verify_randomness()?;
        Ok(beacon)
    }

    /// Reject beacons whose randomness is not the hash of their signature.
    pub fn verify_randomness(&self) -> Result<()> {
        if let Some(randomness) = &self.randomness {
            let expected = Sha256::digest(&self.signature);
            if randomness.as_slice() != expected.as_slice() {
                return Err(TlockError::ChainClient {
                    message: format!("beacon {} randomness does not match signature", self.round),
                    retryable: false,
                });
            }
        }
        Ok(())
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| TlockError::InvalidChainInfo(format!("{field}: {e}")))
}

fn decode_beacon_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| TlockError::ChainClient {
        message: format!("beacon {field}: {e}"),
        retryable: false,
    })
}

// ============================================================================
// ChainClient: injected network layer
// ============================================================================

/// Source of chain metadata and round signatures.
///
/// Implementations own networking, retries and backoff. A signature request for
/// a round that has not been published yet should fail with
/// [`ChainClientErrorKind::NotYetAvailable`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Metadata of the chain this client serves.
    async fn info(&self) -> std::result::Result<ChainInfo, ChainClientError>;

    /// Beacon signature for `round`.
    async fn signature_for_round(
        &self,
        round: u64,
    ) -> std::result::Result<Vec<u8>, ChainClientError>;
}

#[async_trait]
impl<C: ChainClient + ?Sized> ChainClient for Arc<C> {
    async fn info(&self) -> std::result::Result<ChainInfo, ChainClientError> {
        (**self).info().await
    }

    async fn signature_for_round(
        &self,
        round: u64,
    ) -> std::result::Result<Vec<u8>, ChainClientError> {
        (**self).signature_for_round(round).await
    }
}

#[async_trait]
impl<'a, C: ChainClient + ?Sized> ChainClient for &'a C {
    async fn info(&self) -> std::result::Result<ChainInfo, ChainClientError> {
        (**self).info().await
    }

    async fn signature_for_round(
        &self,
        round: u64,
    ) -> std::result::Result<Vec<u8>, ChainClientError> {
        (**self).signature_for_round(round).await
    }
}

/// Error reported by a [`ChainClient`].
#[derive(Debug, Clone)]
pub struct ChainClientError {
    pub message: String,
    pub kind: ChainClientErrorKind,
}

/// Classification of chain client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainClientErrorKind {
    /// The round exists in the future but has not been emitted.
    NotYetAvailable,
    /// Retriable (network, temporary failures)
    Transient,
    /// Not retriable (unknown chain, round that will never exist)
    Permanent,
}

impl ChainClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ChainClientErrorKind::Transient,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: ChainClientErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn not_yet_available(round: u64) -> Self {
        Self::with_kind(
            format!("round {round} not yet published"),
            ChainClientErrorKind::NotYetAvailable,
        )
    }

    /// Convert into the crate error, attributing it to `round` where relevant.
    pub fn into_tlock_error(self, round: u64) -> TlockError {
        match self.kind {
            ChainClientErrorKind::NotYetAvailable => TlockError::RoundNotYetAvailable { round },
            ChainClientErrorKind::Transient => TlockError::ChainClient {
                message: self.message,
                retryable: true,
            },
            ChainClientErrorKind::Permanent => TlockError::ChainClient {
                message: self.message,
                retryable: false,
            },
        }
    }
}

impl std::fmt::Display for ChainClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ChainClientError {}

// ============================================================================
// CachingChainClient
// ============================================================================

/// Wraps a client and fetches chain info at most once.
///
/// The first caller populates the cache; concurrent callers wait for it and
/// then share the same value. A failed fetch leaves the cache empty.
pub struct CachingChainClient<C> {
    inner: C,
    info: OnceCell<ChainInfo>,
}

impl<C: ChainClient> CachingChainClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            info: OnceCell::new(),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ChainClient> ChainClient for CachingChainClient<C> {
    async fn info(&self) -> std::result::Result<ChainInfo, ChainClientError> {
        if let Some(info) = self.info.get() {
            return Ok(info.clone());
        }
        let info = self
            .info
            .get_or_try_init(|| async {
                debug!("chain info cache miss");
                self.inner.info().await
            })
            .await?;
        Ok(info.clone())
    }

    async fn signature_for_round(
        &self,
        round: u64,
    ) -> std::result::Result<Vec<u8>, ChainClientError> {
        self.inner.signature_for_round(round).await
    }
}
