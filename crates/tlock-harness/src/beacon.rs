//! A beacon that signs rounds with a secret derived from a seed.

use ark_bls12_381::{Fr, G1Affine, G2Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};

use tlock_core::ChainInfo;
use tlock_crypto::hash::hash_identity;
use tlock_crypto::{round_identity, GroupPoint, IbeError, IbeVariant, SchemeId};

/// Genesis of the beacon network's quicknet chain, used as the default.
pub const DEFAULT_GENESIS: u64 = 1692803367;

/// Default round period in seconds.
pub const DEFAULT_PERIOD: u64 = 3;

/// Deterministic unchained beacon.
pub struct MockBeacon {
    scheme: SchemeId,
    variant: IbeVariant,
    secret: Fr,
    public_key: Vec<u8>,
}

impl MockBeacon {
    /// Derive the signing secret from `seed`. Chained schemes are rejected.
    pub fn new(scheme: SchemeId, seed: &[u8]) -> Result<Self, IbeError> {
        let variant = scheme.ibe_variant()?;
        let secret = Fr::from_be_bytes_mod_order(&Sha256::digest(seed));
        let public_key = match variant.public_key_group() {
            tlock_crypto::Group::G1 => GroupPoint::G1((G1Affine::generator() * secret).into_affine()),
            tlock_crypto::Group::G2 => GroupPoint::G2((G2Affine::generator() * secret).into_affine()),
        };
        Ok(Self {
            scheme,
            variant,
            secret,
            public_key: public_key.to_compressed()?,
        })
    }

    pub fn scheme(&self) -> SchemeId {
        self.scheme
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// BLS signature over the identity of `round`.
    pub fn sign_round(&self, round: u64) -> Result<Vec<u8>, IbeError> {
        let signature = match hash_identity(self.variant, &round_identity(round))? {
            GroupPoint::G1(point) => GroupPoint::G1((point * self.secret).into_affine()),
            GroupPoint::G2(point) => GroupPoint::G2((point * self.secret).into_affine()),
        };
        signature.to_compressed()
    }

    /// Chain metadata for this beacon.
    pub fn chain_info(&self, period: u64, genesis_time: u64) -> ChainInfo {
        let hash = Sha256::new()
            .chain_update(self.scheme.as_str())
            .chain_update(&self.public_key)
            .chain_update(period.to_be_bytes())
            .chain_update(genesis_time.to_be_bytes())
            .finalize()
            .to_vec();
        ChainInfo {
            hash,
            public_key: self.public_key.clone(),
            period,
            genesis_time,
            scheme: self.scheme,
            beacon_id: "harness".to_string(),
        }
    }
}
