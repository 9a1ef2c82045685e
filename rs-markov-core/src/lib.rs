//! Markov-chain transition storage and query library.
//!
//! This crate is the persistence and query layer behind a Markov-chain
//! sequence generator. It provides:
//! - Named datasets of weighted transitions, keyed by fixed-length windows
//!   of prior tokens encoded into composite state keys
//! - Optional mirrored backward maps for bidirectional generation
//! - A compact JSON snapshot format with polymorphic counter encodings
//! - Training and weighted-sampling logic generic over the storage contract
//!
//! Backends are chosen once at construction; everything above the storage
//! trait never names a concrete backend.

/// Error type shared by storage backends and the generator.
pub mod error;

/// Training-window production and weighted successor sampling.
///
/// Generic over [`storage::Storage`], never over a concrete backend.
pub mod generator;

/// Construction-time configuration record.
pub mod settings;

/// Storage contract, the in-memory JSON backend, and supporting types
/// (weighted multisets, rolling context windows).
pub mod storage;
