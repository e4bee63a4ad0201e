//! # Vault Module: Custodial Accounting
//!
//! A vault holds one tracked asset on behalf of many users and keeps a
//! per-user ledger of who deposited what. Governance (the authority it
//! points at) can halt it, bar addresses from depositing, and rescue
//! *foreign* assets sent to it by mistake. It can never move the tracked
//! asset on anyone's behalf.
//!
//! ## Architecture
//!
//! ```text
//! accounting.rs   Vault<T>, the ledger plus gating, rescue and harvest
//! transfer.rs     AssetTransfer, how value physically moves (token / native)
//! harvest.rs      HarvestStrategy, the yield extension point
//! ```
//!
//! The two deployable flavours are type aliases over the one core:
//! [`TokenVault`] moves a fungible asset, [`NativeVault`] moves native
//! currency.
//!
//! ## Invariant
//!
//! Between calls, `sum(balance_of(u) for all u) == balance()`. A harvest
//! strategy is the only thing allowed to grow `balance()` without crediting
//! a user.

pub mod accounting;
pub mod harvest;
pub mod transfer;

use thiserror::Error;

use aegis_protocol::{Address, Amount, RoleId};

pub use accounting::{Vault, VaultSnapshot};
pub use harvest::{HarvestContext, HarvestStrategy, Unharvestable};
pub use transfer::{AssetTransfer, FungibleTransfer, NativeTransfer, TransferError};

/// A vault custodying a fungible asset.
pub type TokenVault = Vault<FungibleTransfer>;

/// A vault custodying the ledger's native currency.
pub type NativeVault = Vault<NativeTransfer>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by vault operations. Every one of them aborts the call with
/// no net state change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// The caller lacks the role the operation requires.
    #[error("unauthorized: {caller} does not hold role {role}")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
        /// The role that was required.
        role: RoleId,
    },

    /// `init` was called on a vault that is already initialized.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// The vault has not been initialized yet.
    #[error("vault is not initialized")]
    NotInitialized,

    /// Zero-amount deposits, withdrawals and rescues are refused.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,

    /// A required counterparty was the zero address or does not resolve to
    /// a deployed contract.
    #[error("invalid address: {address}")]
    InvalidAddress {
        /// The offending address.
        address: Address,
    },

    /// The account's tracked deposit does not cover the withdrawal.
    #[error("insufficient balance: {account} has {available}, requested {requested}")]
    InsufficientBalance {
        /// The withdrawing account.
        account: Address,
        /// Its tracked deposit.
        available: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// The authority's pause switch is engaged.
    #[error("vault is paused")]
    Paused,

    /// The account is on the authority's blacklist.
    #[error("blacklisted: {account}")]
    Blacklisted {
        /// The blacklisted account.
        account: Address,
    },

    /// Rescue targeted the vault's own tracked asset.
    #[error("rescue of the tracked asset {asset} is forbidden")]
    SelfAssetRescueForbidden {
        /// The tracked asset.
        asset: Address,
    },

    /// Moving value in or out failed.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// The operation is an unimplemented extension point.
    #[error("not implemented")]
    NotImplemented,

    /// A balance or the custodied total would overflow.
    #[error("amount overflow")]
    AmountOverflow,

    /// A deposit could not be credited and returning it to the payer failed
    /// too. The value stays in the vault, credited to nobody.
    #[error("deposit of {amount} from {payer} stranded: not credited, refund failed")]
    DepositStranded {
        /// Who paid.
        payer: Address,
        /// The stranded amount.
        amount: Amount,
    },
}
