//! Key wrapping bound to a future beacon round.
//!
//! The file key is IBE-encrypted to the identity `SHA-256(round)` under the
//! chain's public key and carried in a single stanza:
//!
//! ```text
//! -> tlock <round> <chain hash hex>
//! <base64 of compressed(U) || V || W>
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn, Span};

use tlock_crypto::{round_identity, Ciphertext};

use crate::chain::{ChainClient, ChainInfo};
use crate::envelope::{FileKey, KeyUnwrapper, KeyWrapper};
use crate::error::{from_ibe, Result, TlockError};
use crate::round::{is_round_available, Clock};
use crate::stanza::Stanza;

/// Stanza type of timelock recipients.
pub const STANZA_TYPE: &str = "tlock";

/// Wraps file keys so they open once `round` is published.
pub struct TimelockEncrypter<C> {
    client: C,
    round: u64,
}

impl<C: ChainClient> TimelockEncrypter<C> {
    /// Fails with [`TlockError::InvalidRound`] for round 0, before any network call.
    pub fn new(client: C, round: u64) -> Result<Self> {
        if round == 0 {
            return Err(TlockError::InvalidRound(round));
        }
        Ok(Self { client, round })
    }

    pub fn round(&self) -> u64 {
        self.round
    }
}

#[async_trait]
impl<C: ChainClient> KeyWrapper for TimelockEncrypter<C> {
    async fn wrap(&self, file_key: &FileKey) -> Result<Vec<Stanza>> {
        let info = fetch_info(&self.client, self.round).await?;
        Span::current().record("chain", info.hash_hex().as_str());
        let variant = info.scheme.ibe_variant().map_err(from_ibe)?;
        debug!(round = self.round, scheme = %info.scheme, "wrapping file key");

        let ciphertext = tlock_crypto::encrypt(
            variant,
            &info.public_key,
            &round_identity(self.round),
            file_key.as_bytes(),
        )
        .map_err(from_ibe)?;

        Ok(vec![Stanza::new(
            STANZA_TYPE,
            vec![self.round.to_string(), info.hash_hex()],
            ciphertext.to_bytes().map_err(from_ibe)?,
        )])
    }
}

/// Unwraps `tlock` stanzas with the beacon signature for their round.
pub struct TimelockDecrypter<C> {
    client: C,
    fetch_timeout: Option<Duration>,
    clock: Option<Arc<dyn Clock>>,
}

impl<C: ChainClient> TimelockDecrypter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            fetch_timeout: None,
            clock: None,
        }
    }

    /// Bound the signature fetch. Expiry surfaces as [`TlockError::Timeout`].
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Check round availability against `clock` before asking the client.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    async fn fetch_signature(&self, round: u64) -> Result<Vec<u8>> {
        let fetch = self.client.signature_for_round(round);
        let result = match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| TlockError::Timeout(limit))?,
            None => fetch.await,
        };
        result.map_err(|e| {
            let err = e.into_tlock_error(round);
            if err.is_retryable() {
                warn!(round, error = %err, "beacon signature unavailable");
            }
            err
        })
    }
}

#[async_trait]
impl<C: ChainClient> KeyUnwrapper for TimelockDecrypter<C> {
    async fn unwrap(&self, stanzas: &[Stanza]) -> Result<FileKey> {
        let stanza = match stanzas {
            [only] if only.stanza_type == STANZA_TYPE => only,
            [only] => {
                return Err(TlockError::MalformedStanza(format!(
                    "expected a {STANZA_TYPE} stanza, got {}",
                    only.stanza_type
                )))
            }
            _ => {
                return Err(TlockError::MalformedStanza(format!(
                    "expected exactly one stanza, got {}",
                    stanzas.len()
                )))
            }
        };
        let (round, chain_hash) = parse_args(stanza)?;
        Span::current()
            .record("round", round)
            .record("chain", hex::encode(&chain_hash).as_str());

        let info = fetch_info(&self.client, round).await?;
        if info.hash != chain_hash {
            return Err(TlockError::ChainMismatch {
                stanza: hex::encode(&chain_hash),
                client: info.hash_hex(),
            });
        }
        let variant = info.scheme.ibe_variant().map_err(from_ibe)?;

        if let Some(clock) = &self.clock {
            if !is_round_available(round, clock.now_ms(), &info)? {
                debug!(round, "round is in the future, skipping fetch");
                return Err(TlockError::RoundNotYetAvailable { round });
            }
        }

        let ciphertext = Ciphertext::from_bytes(variant, &stanza.body)
            .map_err(|e| TlockError::MalformedStanza(e.to_string()))?;
        let signature = self.fetch_signature(round).await?;
        debug!(round, scheme = %info.scheme, "unwrapping file key");

        let key = tlock_crypto::decrypt(variant, &signature, &ciphertext).map_err(from_ibe)?;
        FileKey::from_slice(&key)
    }
}

async fn fetch_info<C: ChainClient + ?Sized>(client: &C, round: u64) -> Result<ChainInfo> {
    let info = client.info().await.map_err(|e| e.into_tlock_error(round))?;
    info.validate()?;
    Ok(info)
}

/// `[decimal round, hex chain hash]`
fn parse_args(stanza: &Stanza) -> Result<(u64, Vec<u8>)> {
    let [round, hash] = stanza.args.as_slice() else {
        return Err(TlockError::MalformedStanza(format!(
            "expected 2 arguments, got {}",
            stanza.args.len()
        )));
    };
    if round.is_empty() || !round.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TlockError::MalformedStanza(format!("invalid round {round:?}")));
    }
    let round: u64 = round
        .parse()
        .map_err(|_| TlockError::MalformedStanza(format!("round {round} out of range")))?;
    if round == 0 {
        return Err(TlockError::InvalidRound(round));
    }
    let hash = hex::decode(hash)
        .map_err(|e| TlockError::MalformedStanza(format!("chain hash: {e}")))?;
    Ok((round, hash))
}
