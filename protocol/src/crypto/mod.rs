//! # Cryptographic Primitives
//!
//! Thin wrappers around audited hash implementations. Nothing in here is
//! clever, and it should stay that way.

pub mod hash;

pub use hash::{keccak256, keccak256_multi};
