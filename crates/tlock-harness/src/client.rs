//! In-memory [`ChainClient`] backed by a [`MockBeacon`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use tlock_core::{ChainClient, ChainClientError, ChainClientErrorKind, ChainInfo};
use tlock_crypto::{IbeError, SchemeId};

use crate::beacon::{MockBeacon, DEFAULT_GENESIS, DEFAULT_PERIOD};

const DEFAULT_SEED: &[u8] = b"tlock-harness";

/// Chain client double with controllable publication and fault injection.
///
/// Every round is published until [`publish_through`](Self::publish_through)
/// sets a limit.
pub struct MockChainClient {
    beacon: MockBeacon,
    info: ChainInfo,
    latest_round: AtomicU64,
    substitutions: Mutex<HashMap<u64, u64>>,
    info_failure: Mutex<Option<ChainClientError>>,
    stall: AtomicBool,
    info_calls: AtomicUsize,
    signature_calls: AtomicUsize,
}

impl MockChainClient {
    /// Client for a seeded beacon with a 3 second period.
    pub fn new(scheme: SchemeId) -> Result<Self, IbeError> {
        let beacon = MockBeacon::new(scheme, DEFAULT_SEED)?;
        Ok(Self::with_beacon(beacon, DEFAULT_PERIOD, DEFAULT_GENESIS))
    }

    pub fn with_beacon(beacon: MockBeacon, period: u64, genesis_time: u64) -> Self {
        let info = beacon.chain_info(period, genesis_time);
        Self {
            beacon,
            info,
            latest_round: AtomicU64::new(u64::MAX),
            substitutions: Mutex::new(HashMap::new()),
            info_failure: Mutex::new(None),
            stall: AtomicBool::new(false),
            info_calls: AtomicUsize::new(0),
            signature_calls: AtomicUsize::new(0),
        }
    }

    pub fn beacon(&self) -> &MockBeacon {
        &self.beacon
    }

    pub fn chain_info(&self) -> &ChainInfo {
        &self.info
    }

    /// Publish rounds up to and including `round`; later rounds are unavailable.
    pub fn publish_through(&self, round: u64) {
        self.latest_round.store(round, Ordering::SeqCst);
    }

    /// Answer requests for `requested` with the signature of `served`.
    pub fn serve_signature_of(&self, requested: u64, served: u64) {
        self.substitutions.lock().insert(requested, served);
    }

    /// Make `info()` fail with `error` until cleared with `None`.
    pub fn fail_info_with(&self, error: Option<ChainClientError>) {
        *self.info_failure.lock() = error;
    }

    /// Never resolve signature requests while set.
    pub fn stall_signatures(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn signature_calls(&self) -> usize {
        self.signature_calls.load(Ordering::SeqCst)
    }

    /// Total calls of either kind.
    pub fn network_calls(&self) -> usize {
        self.info_calls() + self.signature_calls()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn info(&self) -> Result<ChainInfo, ChainClientError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.info_failure.lock().clone() {
            return Err(err);
        }
        Ok(self.info.clone())
    }

    async fn signature_for_round(&self, round: u64) -> Result<Vec<u8>, ChainClientError> {
        self.signature_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if round == 0 {
            return Err(ChainClientError::with_kind(
                "round 0 does not exist",
                ChainClientErrorKind::Permanent,
            ));
        }
        if round > self.latest_round.load(Ordering::SeqCst) {
            return Err(ChainClientError::not_yet_available(round));
        }

        let served = self.substitutions.lock().get(&round).copied().unwrap_or(round);
        debug!(round, served, "serving signature");
        self.beacon.sign_round(served).map_err(|e| {
            ChainClientError::with_kind(e.to_string(), ChainClientErrorKind::Permanent)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_signatures_and_counts() {
        let client = MockChainClient::new(SchemeId::BlsUnchainedG1Rfc9380).unwrap();
        let sig = client.signature_for_round(5).await.unwrap();
        assert_eq!(sig, client.beacon().sign_round(5).unwrap());
        client.info().await.unwrap();
        assert_eq!(client.signature_calls(), 1);
        assert_eq!(client.info_calls(), 1);
    }

    #[tokio::test]
    async fn unpublished_rounds_are_not_yet_available() {
        let client = MockChainClient::new(SchemeId::BlsUnchainedG1Rfc9380).unwrap();
        client.publish_through(10);
        assert!(client.signature_for_round(10).await.is_ok());
        let err = client.signature_for_round(11).await.unwrap_err();
        assert_eq!(err.kind, ChainClientErrorKind::NotYetAvailable);
    }

    #[tokio::test]
    async fn substitution_serves_other_round() {
        let client = MockChainClient::new(SchemeId::PedersenBlsUnchained).unwrap();
        client.serve_signature_of(100, 101);
        assert_eq!(
            client.signature_for_round(100).await.unwrap(),
            client.beacon().sign_round(101).unwrap()
        );
    }

    #[tokio::test]
    async fn round_zero_is_permanent_error() {
        let client = MockChainClient::new(SchemeId::BlsUnchainedOnG1).unwrap();
        let err = client.signature_for_round(0).await.unwrap_err();
        assert_eq!(err.kind, ChainClientErrorKind::Permanent);
    }

    #[tokio::test]
    async fn info_failure_injection() {
        let client = MockChainClient::new(SchemeId::BlsUnchainedOnG1).unwrap();
        client.fail_info_with(Some(ChainClientError::new("connection reset")));
        assert!(client.info().await.is_err());
        client.fail_info_with(None);
        assert!(client.info().await.is_ok());
    }
}
