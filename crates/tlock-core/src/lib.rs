//! Timelock encryption on top of a public randomness beacon.
//!
//! A payload is sealed in an age-style envelope whose file key is wrapped with
//! identity-based encryption to a future beacon round. Once the beacon publishes
//! that round's signature, anyone holding the envelope can open it.
//!
//! ```text
//! timelock_encrypt:  payload → envelope(tlock stanza) → armor
//! timelock_decrypt:  armor → envelope → beacon signature → payload
//! ```

pub mod api;
pub mod armor;
pub mod base64;
pub mod chain;
pub mod envelope;
pub mod error;
pub mod hkdf;
pub mod round;
pub mod stanza;
pub mod stream;
pub mod timelock;

pub use api::{
    timelock_decrypt, timelock_decrypt_with_options, timelock_encrypt,
    timelock_encrypt_with_options, TimelockOptions,
};
pub use chain::{
    Beacon, CachingChainClient, ChainClient, ChainClientError, ChainClientErrorKind, ChainInfo,
};
pub use envelope::{Envelope, FileKey, KeyUnwrapper, KeyWrapper};
pub use error::{ErrorKind, Result, TlockError};
pub use round::{current_round, is_round_available, round_at, round_time, Clock, SystemClock};
pub use stanza::Stanza;
pub use timelock::{TimelockDecrypter, TimelockEncrypter, STANZA_TYPE};

pub use tlock_crypto::{IbeVariant, SchemeId};
