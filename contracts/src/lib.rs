//! # AEGIS Custody Contracts
//!
//! The contracts that sit on top of the host ledger:
//!
//! - **Access Authority**: role registry (ADMIN / OPERATOR), global pause
//!   switch and deposit blacklist, consulted by every vault on every call.
//! - **Governed Token**: an ERC20-style asset whose minting is gated by an
//!   authority.
//! - **Vaults**: custody of one tracked asset per vault, either a fungible
//!   token ([`TokenVault`]) or native currency ([`NativeVault`]), with a
//!   per-user deposit ledger.
//!
//! ## Design Principles
//!
//! 1. Every balance change is overflow-checked.
//! 2. Caller identity is always an explicit argument; nothing is ambient.
//! 3. Ledger state is settled before value leaves a vault.
//! 4. Observable state is serializable (serde) through snapshots.

pub mod access_authority;
pub mod token;
pub mod vault;

pub use access_authority::{AccessAuthority, AccessError, AuthoritySnapshot};
pub use token::GovernedToken;
pub use vault::{NativeVault, TokenVault, Vault, VaultError, VaultSnapshot};
