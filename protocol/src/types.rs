//! # Core Ledger Types
//!
//! The three nouns every other module speaks in:
//!
//! - [`Address`]: a 20-byte account or contract identifier.
//! - [`Amount`]: an unsigned quantity of some asset in base units.
//! - [`RoleId`]: a 32-byte permission label, `keccak256(label)`.
//!
//! Both byte-array types render as `0x`-prefixed lowercase hex and serialize
//! as that string, so JSON manifests and reports stay human-editable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{
    ADDRESS_DIGEST_OFFSET, ADDRESS_LENGTH, ADMIN_ROLE_LABEL, HASH_OUTPUT_LENGTH,
    OPERATOR_ROLE_LABEL,
};
use crate::crypto::hash::keccak256;

/// Asset quantity in the smallest denomination.
///
/// `u128` rather than `u64`: a thousand 18-decimal tokens is already
/// `10^21` base units, which does not fit in 64 bits.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from parsing hex-encoded identifiers.
#[derive(Debug, Error, PartialEq)]
pub enum HexParseError {
    /// The input contained non-hex characters or an odd number of digits.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The input decoded to the wrong number of bytes.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], HexParseError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let bytes = hex::decode(digits)?;
    if bytes.len() != N {
        return Err(HexParseError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// [`Address::ZERO`] is the null address. Contracts reject it wherever a
/// real counterparty is required.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The null address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw address bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// An address made of one repeated byte. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; ADDRESS_LENGTH])
    }

    /// Derives an address from the trailing bytes of a 32-byte digest.
    pub fn from_digest(digest: &[u8; HASH_OUTPUT_LENGTH]) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[ADDRESS_DIGEST_OFFSET..]);
        Self(bytes)
    }

    /// Deterministic address for a human-readable label, e.g. `"alice"`.
    pub fn from_label(label: &str) -> Self {
        Self::from_digest(&keccak256(label.as_bytes()))
    }

    /// Returns the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for the null address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses hex with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Address({}..{})", &hex[..8], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// RoleId
// ---------------------------------------------------------------------------

/// A permission label: `keccak256(label)`.
///
/// Roles are flat. Holding ADMIN does not imply OPERATOR in the registry;
/// contracts that accept either check both explicitly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleId([u8; HASH_OUTPUT_LENGTH]);

impl RoleId {
    /// Derives a role from its label. Same bytes as the EVM's
    /// `keccak256(bytes(label))`.
    pub fn from_label(label: &str) -> Self {
        Self(keccak256(label.as_bytes()))
    }

    /// Wraps a raw 32-byte identifier.
    pub const fn from_bytes(bytes: [u8; HASH_OUTPUT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// `keccak256("ADMIN")`.
    pub fn admin() -> Self {
        Self::from_label(ADMIN_ROLE_LABEL)
    }

    /// `keccak256("OPERATOR")`.
    pub fn operator() -> Self {
        Self::from_label(OPERATOR_ROLE_LABEL)
    }

    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_OUTPUT_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses hex with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, HexParseError> {
        decode_fixed(s).map(Self)
    }
}

impl fmt::Debug for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RoleId {
    type Err = HexParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for RoleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
