//! Standard-alphabet base64 in the two forms the formats use.
//!
//! The envelope header uses unpadded base64; armor uses padded base64. Both
//! decoders reject non-canonical encodings.

use base64ct::{Base64, Base64Unpadded, Encoding};

use crate::error::{Result, TlockError};

/// Unpadded standard base64.
pub fn encode_unpadded(data: &[u8]) -> String {
    Base64Unpadded::encode_string(data)
}

pub fn decode_unpadded(s: &str) -> Result<Vec<u8>> {
    Base64Unpadded::decode_vec(s).map_err(|e| TlockError::InvalidBase64(e.to_string()))
}

/// Padded standard base64.
pub fn encode_padded(data: &[u8]) -> String {
    Base64::encode_string(data)
}

pub fn decode_padded(s: &str) -> Result<Vec<u8>> {
    Base64::decode_vec(s).map_err(|e| TlockError::InvalidBase64(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = b"Hello, World!";
        assert_eq!(decode_unpadded(&encode_unpadded(data)).unwrap(), data);
        assert_eq!(decode_padded(&encode_padded(data)).unwrap(), data);
    }

    #[test]
    fn unpadded_has_no_padding() {
        assert_eq!(encode_unpadded(b"ab"), "YWI");
        assert_eq!(encode_padded(b"ab"), "YWI=");
    }

    #[test]
    fn standard_alphabet() {
        let encoded = encode_unpadded(&[0xfb, 0xff, 0xfe]);
        assert_eq!(encoded, "+//+");
    }

    #[test]
    fn rejects_padding_in_unpadded() {
        assert!(decode_unpadded("YWI=").is_err());
    }

    #[test]
    fn rejects_non_canonical_trailing_bits() {
        // "YWJ" carries non-zero bits past the final byte.
        assert!(decode_unpadded("YWJ").is_err());
    }

    #[test]
    fn empty_input() {
        assert_eq!(encode_unpadded(b""), "");
        assert_eq!(decode_unpadded("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_padded("").unwrap(), Vec::<u8>::new());
    }
}
