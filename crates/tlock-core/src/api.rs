//! Public encrypt/decrypt entry points.
//!
//! Encrypt: payload → envelope(tlock stanza) → armor
//! Decrypt: armor (if present) → envelope → tlock unwrap → payload

use std::time::Duration;

use tracing::{debug, field, instrument};

use crate::armor::{self, is_probably_armored, DEFAULT_CHUNK_WIDTH};
use crate::chain::ChainClient;
use crate::envelope::{self, Envelope};
use crate::error::Result;
use crate::timelock::{TimelockDecrypter, TimelockEncrypter};

/// Runtime options for the public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelockOptions {
    /// Emit ASCII armor instead of the binary envelope.
    pub armor: bool,
    /// Armor line width.
    pub chunk_width: usize,
    /// Upper bound on the beacon signature fetch during decryption.
    pub fetch_timeout: Option<Duration>,
}

impl Default for TimelockOptions {
    fn default() -> Self {
        Self {
            armor: true,
            chunk_width: DEFAULT_CHUNK_WIDTH,
            fetch_timeout: None,
        }
    }
}

/// Encrypt `payload` so it opens once `round` is published, returning armored text.
///
/// Round 0 is rejected before `client` is contacted.
pub async fn timelock_encrypt<C>(round: u64, payload: &[u8], client: &C) -> Result<String>
where
    C: ChainClient + ?Sized,
{
    let envelope = seal(round, payload, client).await?;
    armor::encode(&envelope, DEFAULT_CHUNK_WIDTH)
}

/// Encrypt with explicit options. Returns armored text bytes or the binary envelope.
pub async fn timelock_encrypt_with_options<C>(
    round: u64,
    payload: &[u8],
    client: &C,
    options: &TimelockOptions,
) -> Result<Vec<u8>>
where
    C: ChainClient + ?Sized,
{
    let envelope = seal(round, payload, client).await?;
    if options.armor {
        Ok(armor::encode(&envelope, options.chunk_width)?.into_bytes())
    } else {
        Ok(envelope)
    }
}

/// Decrypt armored text or a raw binary envelope.
pub async fn timelock_decrypt<C>(input: &[u8], client: &C) -> Result<Vec<u8>>
where
    C: ChainClient + ?Sized,
{
    timelock_decrypt_with_options(input, client, &TimelockOptions::default()).await
}

#[instrument(
    name = "tlock::decrypt",
    skip_all,
    fields(input_len = input.len(), round = field::Empty, chain = field::Empty)
)]
pub async fn timelock_decrypt_with_options<C>(
    input: &[u8],
    client: &C,
    options: &TimelockOptions,
) -> Result<Vec<u8>>
where
    C: ChainClient + ?Sized,
{
    let armored = std::str::from_utf8(input)
        .ok()
        .filter(|text| is_probably_armored(text));
    let binary = match armored {
        Some(text) => armor::decode(text, options.chunk_width)?,
        None => input.to_vec(),
    };
    debug!(armored = armored.is_some(), "decoding envelope");

    let envelope = Envelope::from_bytes(&binary)?;
    let mut decrypter = TimelockDecrypter::new(client);
    if let Some(limit) = options.fetch_timeout {
        decrypter = decrypter.with_fetch_timeout(limit);
    }
    envelope::decrypt(&envelope, &decrypter).await
}

#[instrument(
    name = "tlock::encrypt",
    skip_all,
    fields(round = round, chain = field::Empty, payload_len = payload.len())
)]
async fn seal<C>(round: u64, payload: &[u8], client: &C) -> Result<Vec<u8>>
where
    C: ChainClient + ?Sized,
{
    let encrypter = TimelockEncrypter::new(client, round)?;
    envelope::encrypt(payload, &encrypter).await?.to_bytes()
}
