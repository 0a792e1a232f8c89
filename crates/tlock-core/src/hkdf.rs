//! HKDF-SHA256 key derivation for the envelope's header and payload keys.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Result, TlockError};

/// Length of every symmetric key in the envelope.
pub const KEY_LENGTH: usize = 32;

/// HKDF info for the header MAC key.
pub const HEADER_INFO: &[u8] = b"header";

/// HKDF info for the payload stream key.
pub const PAYLOAD_INFO: &[u8] = b"payload";

/// Derive a 256-bit key using HKDF-SHA256.
///
/// An empty `salt` is treated as absent, which HKDF defines as a zero block.
pub fn hkdf_derive(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = Zeroizing::new([0u8; KEY_LENGTH]);
    hk.expand(info, &mut okm[..])
        .map_err(|e| TlockError::KeyDerivation(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let ikm = [0x42u8; 32];
        let a = hkdf_derive(&ikm, b"", HEADER_INFO).unwrap();
        let b = hkdf_derive(&ikm, b"", HEADER_INFO).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn header_and_payload_keys_differ() {
        let ikm = [0x42u8; 32];
        let header = hkdf_derive(&ikm, b"", HEADER_INFO).unwrap();
        let payload = hkdf_derive(&ikm, b"", PAYLOAD_INFO).unwrap();
        assert_ne!(*header, *payload);
    }

    #[test]
    fn different_salts_different_keys() {
        let ikm = [0x42u8; 32];
        let a = hkdf_derive(&ikm, &[1u8; 16], PAYLOAD_INFO).unwrap();
        let b = hkdf_derive(&ikm, &[2u8; 16], PAYLOAD_INFO).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn empty_salt_equals_zero_block() {
        let ikm = [7u8; 32];
        let empty = hkdf_derive(&ikm, b"", HEADER_INFO).unwrap();
        let zeros = hkdf_derive(&ikm, &[0u8; 32], HEADER_INFO).unwrap();
        assert_eq!(*empty, *zeros);
    }

    #[test]
    fn rfc5869_test_vector_1() {
        // RFC 5869 Test Case 1 (SHA-256)
        let ikm = hex::decode("0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b").unwrap();
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let expected_prefix =
            hex::decode("3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf")
                .unwrap();
        let result = hkdf_derive(&ikm, &salt, &info).unwrap();
        assert_eq!(result.to_vec(), expected_prefix);
    }
}
