//! Hybrid encryption envelope in the age v1 format.
//!
//! Encrypt: file key → wrap into stanzas → header → HMAC(header) → STREAM(payload)
//! Decrypt: parse header → unwrap file key → verify HMAC → open STREAM
//!
//! Wire format: `<header text> <base64 MAC>\n || nonce:16 || STREAM ciphertext`

use std::fmt;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64::encode_unpadded;
use crate::error::{Result, TlockError};
use crate::hkdf::{hkdf_derive, HEADER_INFO, KEY_LENGTH, PAYLOAD_INFO};
use crate::stanza::{header_mac_input, parse_header, Stanza, MAC_SIZE};
use crate::stream;

/// Payload nonce length in bytes.
pub const NONCE_SIZE: usize = 16;

type HmacSha256 = Hmac<Sha256>;

/// File key lengths accepted on decryption. New keys are always 32 bytes.
pub const FILE_KEY_LENGTHS: [usize; 2] = [16, KEY_LENGTH];

/// Per-message symmetric key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FileKey(Vec<u8>);

impl FileKey {
    /// Generate a random 32-byte file key.
    pub fn generate() -> Result<Self> {
        let mut key = vec![0u8; KEY_LENGTH];
        getrandom::getrandom(&mut key).map_err(|e| TlockError::RngFailed(e.to_string()))?;
        Ok(Self(key))
    }

    /// Wrap recovered key bytes, which must be 16 or 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if !FILE_KEY_LENGTHS.contains(&bytes.len()) {
            return Err(TlockError::MalformedStanza(format!(
                "file key must be 16 or 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileKey([REDACTED])")
    }
}

/// Wraps a file key into one or more stanzas.
#[async_trait]
pub trait KeyWrapper: Send + Sync {
    async fn wrap(&self, file_key: &FileKey) -> Result<Vec<Stanza>>;
}

/// Recovers a file key from the stanzas of a received header.
#[async_trait]
pub trait KeyUnwrapper: Send + Sync {
    /// `stanzas` are passed exactly as received, in header order.
    async fn unwrap(&self, stanzas: &[Stanza]) -> Result<FileKey>;
}

/// A parsed or freshly built envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub stanzas: Vec<Stanza>,
    pub mac: [u8; MAC_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    /// STREAM ciphertext of the payload.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Serialize to the binary envelope format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = header_mac_input(&self.stanzas)?;
        header.push(' ');
        header.push_str(&encode_unpadded(&self.mac));
        header.push('\n');

        let mut out = header.into_bytes();
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Parse a binary envelope. Performs no cryptographic checks.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let parsed = parse_header(bytes)?;
        let body = &bytes[parsed.payload_offset..];
        if body.len() < NONCE_SIZE {
            return Err(TlockError::MalformedHeader(format!(
                "payload of {} bytes is shorter than the {NONCE_SIZE}-byte nonce",
                body.len()
            )));
        }
        let (nonce, payload) = body.split_at(NONCE_SIZE);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            stanzas: parsed.stanzas,
            mac: parsed.mac,
            nonce: nonce_bytes,
            payload: payload.to_vec(),
        })
    }
}

/// HMAC-SHA256 of the header text under a key derived from the file key.
fn header_mac(file_key: &FileKey, stanzas: &[Stanza]) -> Result<HmacSha256> {
    let mac_key = hkdf_derive(file_key.as_bytes(), &[], HEADER_INFO)?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&mac_key[..])
        .map_err(|e| TlockError::KeyDerivation(e.to_string()))?;
    mac.update(header_mac_input(stanzas)?.as_bytes());
    Ok(mac)
}

/// Encrypt `payload` with a fresh file key wrapped by `wrapper`.
///
/// # Arguments
/// * `payload` - Plaintext of any length, including empty
/// * `wrapper` - Strategy that turns the file key into stanzas
pub async fn encrypt<W>(payload: &[u8], wrapper: &W) -> Result<Envelope>
where
    W: KeyWrapper + ?Sized,
{
    let file_key = FileKey::generate()?;
    let stanzas = wrapper.wrap(&file_key).await?;
    if stanzas.is_empty() {
        return Err(TlockError::MalformedStanza(
            "key wrapper produced no stanzas".into(),
        ));
    }

    let mut mac = [0u8; MAC_SIZE];
    mac.copy_from_slice(&header_mac(&file_key, &stanzas)?.finalize().into_bytes());

    let mut nonce = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce).map_err(|e| TlockError::RngFailed(e.to_string()))?;
    let payload_key = hkdf_derive(file_key.as_bytes(), &nonce, PAYLOAD_INFO)?;
    let sealed = stream::seal(&payload_key, payload)?;

    debug!(stanzas = stanzas.len(), payload_len = payload.len(), "envelope sealed");
    Ok(Envelope {
        stanzas,
        mac,
        nonce,
        payload: sealed,
    })
}

/// Decrypt an envelope, recovering the file key through `unwrapper`.
///
/// The header MAC is verified in constant time before the payload is touched.
pub async fn decrypt<U>(envelope: &Envelope, unwrapper: &U) -> Result<Vec<u8>>
where
    U: KeyUnwrapper + ?Sized,
{
    let file_key = unwrapper.unwrap(&envelope.stanzas).await?;

    header_mac(&file_key, &envelope.stanzas)?
        .verify_slice(&envelope.mac)
        .map_err(|_| TlockError::MacVerificationFailed)?;

    let payload_key = hkdf_derive(file_key.as_bytes(), &envelope.nonce, PAYLOAD_INFO)?;
    stream::open(&payload_key, &envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stores the file key in the clear. Test-only.
    struct PlainWrap;

    #[async_trait]
    impl KeyWrapper for PlainWrap {
        async fn wrap(&self, file_key: &FileKey) -> Result<Vec<Stanza>> {
            Ok(vec![Stanza::new("plain", vec![], file_key.as_bytes().to_vec())])
        }
    }

    #[async_trait]
    impl KeyUnwrapper for PlainWrap {
        async fn unwrap(&self, stanzas: &[Stanza]) -> Result<FileKey> {
            FileKey::from_slice(&stanzas[0].body)
        }
    }

    struct EmptyWrap;

    #[async_trait]
    impl KeyWrapper for EmptyWrap {
        async fn wrap(&self, _file_key: &FileKey) -> Result<Vec<Stanza>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn round_trip_through_bytes() {
        for payload in [&b""[..], &b"hello"[..], &[0xabu8; 70_000][..]] {
            let envelope = encrypt(payload, &PlainWrap).await.unwrap();
            let bytes = envelope.to_bytes().unwrap();
            assert!(bytes.starts_with(b"age-encryption.org/v1\n-> plain\n"));

            let parsed = Envelope::from_bytes(&bytes).unwrap();
            assert_eq!(parsed, envelope);
            assert_eq!(decrypt(&parsed, &PlainWrap).await.unwrap(), payload);
        }
    }

    #[tokio::test]
    async fn fresh_key_and_nonce_each_time() {
        let a = encrypt(b"same", &PlainWrap).await.unwrap();
        let b = encrypt(b"same", &PlainWrap).await.unwrap();
        assert_ne!(a.stanzas[0].body, b.stanzas[0].body);
        assert_ne!(a.nonce, b.nonce);
    }

    #[tokio::test]
    async fn flipped_mac_fails_before_payload() {
        let mut envelope = encrypt(b"hello", &PlainWrap).await.unwrap();
        envelope.mac[0] ^= 1;
        envelope.payload.clear();
        assert!(matches!(
            decrypt(&envelope, &PlainWrap).await,
            Err(TlockError::MacVerificationFailed)
        ));
    }

    #[tokio::test]
    async fn edited_stanza_args_fail_mac() {
        let mut envelope = encrypt(b"hello", &PlainWrap).await.unwrap();
        envelope.stanzas[0].args.push("extra".into());
        assert!(matches!(
            decrypt(&envelope, &PlainWrap).await,
            Err(TlockError::MacVerificationFailed)
        ));
    }

    #[tokio::test]
    async fn flipped_payload_fails() {
        let mut envelope = encrypt(b"hello", &PlainWrap).await.unwrap();
        envelope.payload[0] ^= 1;
        assert!(matches!(
            decrypt(&envelope, &PlainWrap).await,
            Err(TlockError::PayloadDecryptionFailed(_))
        ));
    }

    #[tokio::test]
    async fn flipped_nonce_fails() {
        let mut envelope = encrypt(b"hello", &PlainWrap).await.unwrap();
        envelope.nonce[15] ^= 1;
        assert!(decrypt(&envelope, &PlainWrap).await.is_err());
    }

    #[tokio::test]
    async fn wrapper_must_produce_stanzas() {
        assert!(matches!(
            encrypt(b"x", &EmptyWrap).await,
            Err(TlockError::MalformedStanza(_))
        ));
    }

    #[test]
    fn from_bytes_requires_nonce() {
        let mut text = header_mac_input(&[Stanza::new("plain", vec![], vec![1])]).unwrap();
        text.push(' ');
        text.push_str(&encode_unpadded(&[0u8; MAC_SIZE]));
        text.push('\n');
        let mut bytes = text.into_bytes();
        bytes.extend_from_slice(&[0u8; 15]);
        let err = Envelope::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, TlockError::MalformedHeader(_)), "{err}");
        assert_eq!(err.kind(), crate::error::ErrorKind::InputValidation);
    }

    #[test]
    fn file_key_debug_is_redacted() {
        let key = FileKey::from_slice(&[0x41; KEY_LENGTH]).unwrap();
        assert_eq!(format!("{key:?}"), "FileKey([REDACTED])");
    }

    #[test]
    fn file_key_lengths() {
        assert_eq!(FileKey::generate().unwrap().as_bytes().len(), 32);
        assert!(FileKey::from_slice(&[0u8; 16]).is_ok());
        assert!(FileKey::from_slice(&[0u8; 24]).is_err());
    }

    #[tokio::test]
    async fn sixteen_byte_file_key_opens() {
        struct Fixed;

        #[async_trait]
        impl KeyUnwrapper for Fixed {
            async fn unwrap(&self, _stanzas: &[Stanza]) -> Result<FileKey> {
                FileKey::from_slice(&[3u8; 16])
            }
        }

        let file_key = FileKey::from_slice(&[3u8; 16]).unwrap();
        let stanzas = vec![Stanza::new("fixed", vec![], vec![])];
        let mut mac = [0u8; MAC_SIZE];
        mac.copy_from_slice(&header_mac(&file_key, &stanzas).unwrap().finalize().into_bytes());
        let nonce = [4u8; NONCE_SIZE];
        let payload_key = hkdf_derive(file_key.as_bytes(), &nonce, PAYLOAD_INFO).unwrap();
        let envelope = Envelope {
            stanzas,
            mac,
            nonce,
            payload: stream::seal(&payload_key, b"short key").unwrap(),
        };
        assert_eq!(decrypt(&envelope, &Fixed).await.unwrap(), b"short key");
    }
}
