// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # AEGIS Protocol: Host Ledger Primitives
//!
//! Everything the custody contracts need from the chain they run on, and
//! nothing they don't. The contracts crate builds authorities, tokens and
//! vaults on top of these pieces; this crate knows nothing about roles
//! beyond how their identifiers are derived.
//!
//! ## Architecture
//!
//! - **types**: `Address`, `Amount`, `RoleId`.
//! - **crypto**: Keccak-256, the hash EVM state is keyed by.
//! - **asset**: The fungible asset interface vaults consume.
//! - **authority**: The read-only authority interface vaults query.
//! - **ledger**: Native balances, contract directory, address allocation.
//! - **config**: Protocol constants and the permission taxonomy labels.

pub mod asset;
pub mod authority;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod types;

pub use asset::{AssetError, FungibleAsset};
pub use authority::Authority;
pub use ledger::{Ledger, LedgerError, NativeReceiver};
pub use types::{Address, Amount, HexParseError, RoleId};
