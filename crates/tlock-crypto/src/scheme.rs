//! Beacon scheme identifiers and the IBE variant each one selects.
//!
//! A beacon chain advertises its signing scheme by name. Three unchained schemes
//! can serve as timelock key authorities; they differ in which pairing group holds
//! the public key and which domain separation tag hashes the round identity.

use std::fmt;
use std::str::FromStr;

use crate::error::IbeError;

/// Compressed G1 point size in bytes.
pub const G1_SIZE: usize = 48;

/// Compressed G2 point size in bytes.
pub const G2_SIZE: usize = 96;

/// Hash-to-curve DST used by beacons that sign on G2.
pub const G2_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Hash-to-curve DST for RFC 9380 compliant signatures on G1.
pub const G1_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// One of the two BLS12-381 source groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    G1,
    G2,
}

impl Group {
    /// Compressed point size for this group.
    pub fn point_size(self) -> usize {
        match self {
            Group::G1 => G1_SIZE,
            Group::G2 => G2_SIZE,
        }
    }

    /// The other source group.
    pub fn opposite(self) -> Group {
        match self {
            Group::G1 => Group::G2,
            Group::G2 => Group::G1,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::G1 => f.write_str("G1"),
            Group::G2 => f.write_str("G2"),
        }
    }
}

/// Signing scheme advertised in beacon chain metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeId {
    /// Public key on G1, each signature chained to the previous one.
    PedersenBlsChained,
    /// Public key on G1, signatures on G2.
    PedersenBlsUnchained,
    /// Public key on G2, signatures on G1 hashed with the G2 DST string.
    BlsUnchainedOnG1,
    /// Public key on G2, signatures on G1 hashed per RFC 9380.
    BlsUnchainedG1Rfc9380,
}

impl SchemeId {
    /// Wire name of the scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemeId::PedersenBlsChained => "pedersen-bls-chained",
            SchemeId::PedersenBlsUnchained => "pedersen-bls-unchained",
            SchemeId::BlsUnchainedOnG1 => "bls-unchained-on-g1",
            SchemeId::BlsUnchainedG1Rfc9380 => "bls-unchained-g1-rfc9380",
        }
    }

    /// Group holding the chain's public key.
    pub fn public_key_group(self) -> Group {
        match self {
            SchemeId::PedersenBlsChained | SchemeId::PedersenBlsUnchained => Group::G1,
            SchemeId::BlsUnchainedOnG1 | SchemeId::BlsUnchainedG1Rfc9380 => Group::G2,
        }
    }

    /// IBE variant for timelock encryption under this scheme.
    ///
    /// Chained schemes sign `H(previous_signature || round)`, so a future round's
    /// identity is unknown at encryption time and they are rejected.
    pub fn ibe_variant(self) -> Result<IbeVariant, IbeError> {
        match self {
            SchemeId::PedersenBlsChained => Err(IbeError::UnsupportedScheme(
                self.as_str().to_string(),
            )),
            SchemeId::PedersenBlsUnchained => Ok(IbeVariant::G1PublicKey),
            SchemeId::BlsUnchainedOnG1 => Ok(IbeVariant::G2PublicKeyLegacyDst),
            SchemeId::BlsUnchainedG1Rfc9380 => Ok(IbeVariant::G2PublicKeyRfc9380),
        }
    }
}

impl FromStr for SchemeId {
    type Err = IbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pedersen-bls-chained" => Ok(SchemeId::PedersenBlsChained),
            "pedersen-bls-unchained" => Ok(SchemeId::PedersenBlsUnchained),
            "bls-unchained-on-g1" => Ok(SchemeId::BlsUnchainedOnG1),
            "bls-unchained-g1-rfc9380" => Ok(SchemeId::BlsUnchainedG1Rfc9380),
            other => Err(IbeError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three IBE code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IbeVariant {
    /// Public key and ciphertext `U` on G1, identity hashed to G2.
    G1PublicKey,
    /// Public key and `U` on G2, identity hashed to G1 with [`G2_DST`].
    G2PublicKeyLegacyDst,
    /// Public key and `U` on G2, identity hashed to G1 with [`G1_DST`].
    G2PublicKeyRfc9380,
}

impl IbeVariant {
    /// Group of the public key and of the ciphertext point `U`.
    pub fn public_key_group(self) -> Group {
        match self {
            IbeVariant::G1PublicKey => Group::G1,
            IbeVariant::G2PublicKeyLegacyDst | IbeVariant::G2PublicKeyRfc9380 => Group::G2,
        }
    }

    /// Group of beacon signatures and hashed identities.
    pub fn signature_group(self) -> Group {
        self.public_key_group().opposite()
    }

    /// Domain separation tag for hashing an identity onto the signature group.
    pub fn identity_dst(self) -> &'static [u8] {
        match self {
            IbeVariant::G1PublicKey | IbeVariant::G2PublicKeyLegacyDst => G2_DST,
            IbeVariant::G2PublicKeyRfc9380 => G1_DST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SchemeId; 4] = [
        SchemeId::PedersenBlsChained,
        SchemeId::PedersenBlsUnchained,
        SchemeId::BlsUnchainedOnG1,
        SchemeId::BlsUnchainedG1Rfc9380,
    ];

    #[test]
    fn wire_names_parse_back() {
        for scheme in ALL {
            assert_eq!(scheme.as_str().parse::<SchemeId>().unwrap(), scheme);
        }
    }

    #[test]
    fn unknown_scheme_rejected() {
        let err = "bls-unchained-on-g3".parse::<SchemeId>().unwrap_err();
        assert!(matches!(err, IbeError::UnsupportedScheme(ref s) if s == "bls-unchained-on-g3"));
    }

    #[test]
    fn chained_scheme_has_no_ibe_variant() {
        assert!(matches!(
            SchemeId::PedersenBlsChained.ibe_variant(),
            Err(IbeError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn variants_match_public_key_group() {
        for scheme in ALL.into_iter().skip(1) {
            let variant = scheme.ibe_variant().unwrap();
            assert_eq!(variant.public_key_group(), scheme.public_key_group());
            assert_ne!(variant.signature_group(), variant.public_key_group());
        }
    }

    #[test]
    fn legacy_g1_scheme_uses_g2_dst() {
        assert_eq!(IbeVariant::G2PublicKeyLegacyDst.identity_dst(), G2_DST);
        assert_eq!(IbeVariant::G2PublicKeyRfc9380.identity_dst(), G1_DST);
    }
}
