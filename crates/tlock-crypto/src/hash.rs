//! Hash functions for the timelock IBE.
//!
//! - Identity: `SHA-256(round as u64 BE)`
//! - H1: identity onto the signature group (RFC 9380 hash-to-curve, SSWU + isogeny)
//! - H2: GT element to a pad, `SHA-256("IBE-H2" || gt)`
//! - H3: `(sigma, msg)` to a scalar by counter-prefixed rejection sampling
//! - H4: sigma to a pad, `SHA-256("IBE-H4" || sigma)`
//!
//! H2 and H4 truncate to the message length, so messages are at most 32 bytes.

use ark_bls12_381::{g1, g2, Bls12_381, Fr, G1Projective, G2Projective};
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurveBasedHasher;
use ark_ec::hashing::HashToCurve;
use ark_ec::pairing::PairingOutput;
use ark_ff::field_hashers::DefaultFieldHasher;
use ark_ff::{BigInt, PrimeField};
use ark_serialize::CanonicalSerialize;
use sha2::{Digest, Sha256};

use crate::error::IbeError;
use crate::point::GroupPoint;
use crate::scheme::IbeVariant;

/// Size of a round identity in bytes.
pub const IDENTITY_SIZE: usize = 32;

/// Output size of the pad hashes, and the largest message the IBE accepts.
pub const HASH_SIZE: usize = 32;

const H2_TAG: &[u8] = b"IBE-H2";
const H3_TAG: &[u8] = b"IBE-H3";
const H4_TAG: &[u8] = b"IBE-H4";

type G1Hasher = MapToCurveBasedHasher<G1Projective, DefaultFieldHasher<Sha256, 128>, WBMap<g1::Config>>;
type G2Hasher = MapToCurveBasedHasher<G2Projective, DefaultFieldHasher<Sha256, 128>, WBMap<g2::Config>>;

/// Identity a beacon signs for an unchained round.
pub fn round_identity(round: u64) -> [u8; IDENTITY_SIZE] {
    Sha256::digest(round.to_be_bytes()).into()
}

/// H1: hash an identity onto the signature group of `variant`.
pub fn hash_identity(variant: IbeVariant, identity: &[u8]) -> Result<GroupPoint, IbeError> {
    let dst = variant.identity_dst();
    match variant {
        IbeVariant::G1PublicKey => {
            let hasher = G2Hasher::new(dst).map_err(|e| IbeError::HashToCurve(e.to_string()))?;
            let point = hasher
                .hash(identity)
                .map_err(|e| IbeError::HashToCurve(e.to_string()))?;
            Ok(GroupPoint::G2(point))
        }
        IbeVariant::G2PublicKeyLegacyDst | IbeVariant::G2PublicKeyRfc9380 => {
            let hasher = G1Hasher::new(dst).map_err(|e| IbeError::HashToCurve(e.to_string()))?;
            let point = hasher
                .hash(identity)
                .map_err(|e| IbeError::HashToCurve(e.to_string()))?;
            Ok(GroupPoint::G1(point))
        }
    }
}

/// Serialize a GT element big-endian, highest tower coefficient first.
///
/// Arkworks writes coefficients lowest first with little-endian limbs, so the
/// canonical form is exactly its byte reversal.
pub fn gt_to_bytes(gt: &PairingOutput<Bls12_381>) -> Result<Vec<u8>, IbeError> {
    let mut bytes = Vec::with_capacity(576);
    gt.0.serialize_compressed(&mut bytes)
        .map_err(|e| IbeError::SerializationError(e.to_string()))?;
    bytes.reverse();
    Ok(bytes)
}

/// H2: pad derived from the pairing value.
pub fn h2(gt: &PairingOutput<Bls12_381>, len: usize) -> Result<Vec<u8>, IbeError> {
    let digest = Sha256::new()
        .chain_update(H2_TAG)
        .chain_update(gt_to_bytes(gt)?)
        .finalize();
    Ok(digest[..len.min(HASH_SIZE)].to_vec())
}

/// H3: scalar derived from sigma and the message.
pub fn h3(sigma: &[u8], message: &[u8]) -> Result<Fr, IbeError> {
    let seed = Sha256::new()
        .chain_update(H3_TAG)
        .chain_update(sigma)
        .chain_update(message)
        .finalize();

    for i in 1..u16::MAX {
        let mut data: [u8; HASH_SIZE] = Sha256::new()
            .chain_update(i.to_le_bytes())
            .chain_update(seed)
            .finalize()
            .into();
        // Fr is 255 bits; drop the top bit before the range check.
        data[0] >>= 1;
        if let Some(scalar) = scalar_from_be_bytes(&data) {
            return Ok(scalar);
        }
    }
    Err(IbeError::ScalarDerivation)
}

/// H4: pad derived from sigma.
pub fn h4(sigma: &[u8], len: usize) -> Vec<u8> {
    let digest = Sha256::new()
        .chain_update(H4_TAG)
        .chain_update(sigma)
        .finalize();
    digest[..len.min(HASH_SIZE)].to_vec()
}

/// Interpret 32 big-endian bytes as a scalar, rejecting values not below the order.
fn scalar_from_be_bytes(bytes: &[u8; HASH_SIZE]) -> Option<Fr> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.rchunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(word);
    }
    Fr::from_bigint(BigInt::new(limbs))
}
