//! Compressed point encoding for the two BLS12-381 source groups.
//!
//! Points use the ZCash compressed format: G1 is 48 bytes and G2 is 96 bytes,
//! big-endian with flag bits in the top of the first byte.

use ark_bls12_381::{G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::error::IbeError;
use crate::scheme::Group;

/// A point on either source group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPoint {
    G1(G1Affine),
    G2(G2Affine),
}

impl GroupPoint {
    /// Group this point lives in.
    pub fn group(&self) -> Group {
        match self {
            GroupPoint::G1(_) => Group::G1,
            GroupPoint::G2(_) => Group::G2,
        }
    }

    /// Decode a compressed point, checking it is on the curve and in the subgroup.
    ///
    /// The point at infinity is rejected under every flag encoding. Public keys,
    /// signatures and `U` are never the identity, and an identity public key
    /// would make every pairing trivial.
    pub fn from_compressed(group: Group, bytes: &[u8]) -> Result<Self, IbeError> {
        if bytes.len() != group.point_size() {
            return Err(IbeError::InvalidPointLength {
                group,
                expected: group.point_size(),
                got: bytes.len(),
            });
        }
        let point = match group {
            Group::G1 => G1Affine::deserialize_compressed(bytes).map(GroupPoint::G1),
            Group::G2 => G2Affine::deserialize_compressed(bytes).map(GroupPoint::G2),
        }
        .map_err(|_| IbeError::InvalidPoint { group })?;
        if point.is_identity() {
            return Err(IbeError::InvalidPoint { group });
        }
        Ok(point)
    }

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> bool {
        match self {
            GroupPoint::G1(p) => p.is_zero(),
            GroupPoint::G2(p) => p.is_zero(),
        }
    }

    /// Encode in compressed form.
    pub fn to_compressed(&self) -> Result<Vec<u8>, IbeError> {
        let mut out = Vec::with_capacity(self.group().point_size());
        match self {
            GroupPoint::G1(p) => p.serialize_compressed(&mut out),
            GroupPoint::G2(p) => p.serialize_compressed(&mut out),
        }
        .map_err(|e| IbeError::SerializationError(e.to_string()))?;
        Ok(out)
    }
}
