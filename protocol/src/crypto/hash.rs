//! # Hashing Utilities
//!
//! AEGIS speaks to EVM-deployed state, so the one hash that matters is
//! Keccak-256 (the pre-standard padding variant, *not* NIST SHA3-256).
//! Role identifiers and contract addresses are both derived from it and
//! must match byte-for-byte what the EVM's `keccak256` produces.

use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 digest of the input data.
///
/// # Example
///
/// ```
/// use aegis_protocol::crypto::keccak256;
///
/// let hash = keccak256(b"ADMIN");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Equivalent to `keccak256(parts.concat())`, i.e. the EVM's
/// `keccak256(abi.encodePacked(a, b, ...))` for byte-string inputs.
pub fn keccak256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
