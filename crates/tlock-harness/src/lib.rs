//! Test doubles for timelock encryption.
//!
//! A seeded [`MockBeacon`] signs rounds with a known secret, and
//! [`MockChainClient`] serves its metadata and signatures through the
//! [`tlock_core::ChainClient`] trait with controllable publication, signature
//! substitution, stalls and call counting.

#![forbid(unsafe_code)]

pub mod beacon;
pub mod client;
pub mod noop;

pub use beacon::{MockBeacon, DEFAULT_GENESIS, DEFAULT_PERIOD};
pub use client::MockChainClient;
pub use noop::{NoopKeyWrap, NOOP_STANZA_TYPE};
