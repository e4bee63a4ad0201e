//! # Protocol Configuration & Constants
//!
//! Every magic number in AEGIS lives here. Role labels in particular are
//! part of the deployed contract surface: change one and every authority
//! already on chain stops recognising its own administrators.

// ---------------------------------------------------------------------------
// Permission Taxonomy
// ---------------------------------------------------------------------------

/// Label hashed into [`crate::types::RoleId::admin`]. Holders may mutate
/// role membership, the pause switch and the blacklist.
pub const ADMIN_ROLE_LABEL: &str = "ADMIN";

/// Label hashed into [`crate::types::RoleId::operator`]. Holders may rescue
/// foreign assets, harvest, and mint governed tokens.
pub const OPERATOR_ROLE_LABEL: &str = "OPERATOR";

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Account and contract addresses are 20 bytes, EVM style.
pub const ADDRESS_LENGTH: usize = 20;

/// Role identifiers and hash digests are 32 bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Contract addresses are the trailing [`ADDRESS_LENGTH`] bytes of
/// `keccak256(deployer || nonce)`; this is the offset into the digest.
pub const ADDRESS_DIGEST_OFFSET: usize = HASH_OUTPUT_LENGTH - ADDRESS_LENGTH;

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Decimal places of governed tokens and of the native currency.
/// Display only: the ledger never divides.
pub const TOKEN_DECIMALS: u8 = 18;

/// One whole unit (`10^18` base units) of an 18-decimal asset.
pub const ONE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Converts whole units to base units, or `None` on overflow.
pub fn to_base_units(whole: u128) -> Option<u128> {
    whole.checked_mul(ONE_UNIT)
}
