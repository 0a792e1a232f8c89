use thiserror::Error;

use crate::scheme::Group;

#[derive(Debug, Error)]
pub enum IbeError {
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid {group} point encoding")]
    InvalidPoint { group: Group },

    #[error("Invalid {group} point length: expected {expected} bytes, got {got}")]
    InvalidPointLength {
        group: Group,
        expected: usize,
        got: usize,
    },

    #[error("Invalid message length: expected 1..={max} bytes, got {got}")]
    InvalidMessageLength { max: usize, got: usize },

    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    #[error("Decryption integrity check failed")]
    IntegrityCheckFailed,

    #[error("Hash to curve failed: {0}")]
    HashToCurve(String),

    #[error("Could not derive a scalar from sigma and message")]
    ScalarDerivation,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
