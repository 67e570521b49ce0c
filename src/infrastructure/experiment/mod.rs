//! Infrastructure layer for the A/B test engine
//!
//! Provides the deterministic hashing and bucketing machinery plus the
//! in-memory store implementation.

mod bucketing;
mod hashing;
mod memory;

pub use bucketing::VariantBucketer;
pub use hashing::stable_hash_32;
pub use memory::{InMemoryStore, StoreCounts};
