//! Identity-based encryption over BLS12-381 for timelock encryption.
//!
//! A beacon chain signs each round; the signature is the private key for the
//! identity `SHA-256(round)`. Anything encrypted to that identity under the
//! chain's public key opens once the round is published.

pub mod error;
pub mod hash;
pub mod ibe;
pub mod point;
pub mod scheme;

pub use error::IbeError;
pub use hash::round_identity;
pub use ibe::{decrypt, encrypt, Ciphertext, MAX_MESSAGE_SIZE};
pub use point::GroupPoint;
pub use scheme::{Group, IbeVariant, SchemeId, G1_SIZE, G2_SIZE};
