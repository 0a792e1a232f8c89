//! STREAM payload encryption: ChaCha20-Poly1305 over 64 KiB chunks.
//!
//! Chunk `i` uses the nonce `i as 11-byte big-endian || flag`, where `flag` is
//! 1 on the final chunk and 0 otherwise. Truncation, reordering and appended
//! chunks therefore all fail authentication.

use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};

use crate::error::{Result, TlockError};
use crate::hkdf::KEY_LENGTH;

/// Plaintext bytes per chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Poly1305 tag length.
pub const TAG_SIZE: usize = 16;

const ENCRYPTED_CHUNK_SIZE: usize = CHUNK_SIZE + TAG_SIZE;

fn chunk_nonce(counter: u64, last: bool) -> Nonce {
    let mut nonce = [0u8; 12];
    nonce[3..11].copy_from_slice(&counter.to_be_bytes());
    nonce[11] = u8::from(last);
    *Nonce::from_slice(&nonce)
}

/// Encrypt `plaintext` under a 32-byte payload key.
pub fn seal(key: &[u8; KEY_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let chunk_count = plaintext.len().div_ceil(CHUNK_SIZE).max(1);
    let mut out = Vec::with_capacity(plaintext.len() + chunk_count * TAG_SIZE);

    for index in 0..chunk_count {
        let start = index * CHUNK_SIZE;
        let end = (start + CHUNK_SIZE).min(plaintext.len());
        let last = index + 1 == chunk_count;
        let sealed = cipher
            .encrypt(&chunk_nonce(index as u64, last), &plaintext[start..end])
            .map_err(|e| TlockError::PayloadEncryptionFailed(e.to_string()))?;
        out.extend_from_slice(&sealed);
    }
    Ok(out)
}

/// Decrypt and authenticate a sealed payload.
pub fn open(key: &[u8; KEY_LENGTH], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_SIZE {
        return Err(TlockError::PayloadDecryptionFailed(
            "payload shorter than one chunk".into(),
        ));
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut out = Vec::with_capacity(ciphertext.len());
    let mut rest = ciphertext;
    let mut counter = 0u64;

    loop {
        let take = rest.len().min(ENCRYPTED_CHUNK_SIZE);
        let (chunk, tail) = rest.split_at(take);
        let last = tail.is_empty();

        if chunk.len() < TAG_SIZE {
            return Err(TlockError::PayloadDecryptionFailed("truncated chunk".into()));
        }
        if last && chunk.len() == TAG_SIZE && counter > 0 {
            return Err(TlockError::PayloadDecryptionFailed(
                "empty final chunk after data".into(),
            ));
        }

        let plain = cipher
            .decrypt(&chunk_nonce(counter, last), chunk)
            .map_err(|_| {
                TlockError::PayloadDecryptionFailed(format!("chunk {counter} failed authentication"))
            })?;
        out.extend_from_slice(&plain);

        if last {
            return Ok(out);
        }
        rest = tail;
        counter += 1;
    }
}
