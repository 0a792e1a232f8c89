use std::time::Duration;

use thiserror::Error;
use tlock_crypto::IbeError;

/// Broad classes of failure, used by callers to pick a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any network or cryptographic work.
    InputValidation,
    /// Unknown or unusable beacon scheme.
    Scheme,
    /// A cryptographic check failed. Never retry.
    Integrity,
    /// The chain client failed or the round is not published yet.
    External,
}

#[derive(Debug, Error)]
pub enum TlockError {
    #[error("Invalid round {0}: rounds start at 1")]
    InvalidRound(u64),

    #[error("Invalid chain info: {0}")]
    InvalidChainInfo(String),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Decryption integrity check failed: wrong round, wrong chain or corrupted ciphertext")]
    DecryptionIntegrityError,

    #[error("Malformed stanza: {0}")]
    MalformedStanza(String),

    #[error("Chain mismatch: stanza is for chain {stanza}, client serves {client}")]
    ChainMismatch { stanza: String, client: String },

    #[error("Header MAC verification failed")]
    MacVerificationFailed,

    #[error("Payload decryption failed: {0}")]
    PayloadDecryptionFailed(String),

    #[error("Armor has {got} trailing whitespace characters, limit is {max}")]
    ExcessiveWhitespace { got: usize, max: usize },

    #[error("Armor header not found")]
    MissingHeader,

    #[error("Armor footer not found")]
    MissingFooter,

    #[error("Armor line {line} is {got} characters, limit is {max}")]
    LineTooLong { line: usize, got: usize, max: usize },

    #[error("Armor line {line} is {got} characters, expected {width}")]
    LineTooShort { line: usize, got: usize, width: usize },

    #[error("Invalid armor chunk width: {0}")]
    InvalidChunkWidth(usize),

    #[error("Armor last line is {got} characters, must be shorter than {width}")]
    LastLineTooLong { got: usize, width: usize },

    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Round {round} is not yet available")]
    RoundNotYetAvailable { round: u64 },

    #[error("Chain client error: {message}")]
    ChainClient { message: String, retryable: bool },

    #[error("Beacon fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Payload encryption failed: {0}")]
    PayloadEncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),

    #[error("IBE error: {0}")]
    Ibe(#[from] IbeError),
}

impl TlockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TlockError::InvalidRound(_)
            | TlockError::InvalidChainInfo(_)
            | TlockError::MalformedStanza(_)
            | TlockError::ChainMismatch { .. }
            | TlockError::ExcessiveWhitespace { .. }
            | TlockError::MissingHeader
            | TlockError::MissingFooter
            | TlockError::LineTooLong { .. }
            | TlockError::LineTooShort { .. }
            | TlockError::LastLineTooLong { .. }
            | TlockError::InvalidChunkWidth(_)
            | TlockError::InvalidBase64(_)
            | TlockError::MalformedHeader(_) => ErrorKind::InputValidation,

            TlockError::UnsupportedScheme(_) => ErrorKind::Scheme,

            TlockError::DecryptionIntegrityError
            | TlockError::MacVerificationFailed
            | TlockError::PayloadDecryptionFailed(_)
            | TlockError::PayloadEncryptionFailed(_)
            | TlockError::KeyDerivation(_)
            | TlockError::RngFailed(_) => ErrorKind::Integrity,

            TlockError::RoundNotYetAvailable { .. }
            | TlockError::ChainClient { .. }
            | TlockError::Timeout(_) => ErrorKind::External,

            TlockError::Ibe(e) => match e {
                IbeError::UnsupportedScheme(_) => ErrorKind::Scheme,
                IbeError::IntegrityCheckFailed => ErrorKind::Integrity,
                _ => ErrorKind::InputValidation,
            },
        }
    }

    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TlockError::RoundNotYetAvailable { .. } | TlockError::Timeout(_) => true,
            TlockError::ChainClient { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Lift IBE failures into the named variants callers match on.
pub(crate) fn from_ibe(err: IbeError) -> TlockError {
    match err {
        IbeError::IntegrityCheckFailed => TlockError::DecryptionIntegrityError,
        IbeError::UnsupportedScheme(s) => TlockError::UnsupportedScheme(s),
        other => TlockError::Ibe(other),
    }
}

pub type Result<T> = std::result::Result<T, TlockError>;
