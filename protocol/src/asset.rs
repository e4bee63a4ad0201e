//! # Fungible Asset Interface
//!
//! The ERC20-shaped surface a vault consumes. The protocol does not care how
//! an asset keeps its books, only that it honours these calls and reports
//! failure as a typed error instead of silently returning `false`.
//!
//! Every mutating call takes the acting address explicitly: `caller` for
//! `transfer`, `spender` for `transfer_from`, `owner` for `approve`. That is
//! the transaction sender as the asset contract would see it.

use thiserror::Error;

use crate::types::{Address, Amount};

/// Errors an asset can raise from a transfer, approval, or mint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The sending account does not hold enough of the asset.
    #[error("insufficient balance: {owner} holds {balance}, requested {requested}")]
    InsufficientBalance {
        /// The account being debited.
        owner: Address,
        /// Its current balance.
        balance: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance: {spender} may move {allowance} of {owner}, requested {requested}")]
    InsufficientAllowance {
        /// The account whose funds would move.
        owner: Address,
        /// The account attempting the move.
        spender: Address,
        /// The remaining allowance.
        allowance: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// Transfers and mints to the null address are refused.
    #[error("invalid recipient: the zero address cannot receive assets")]
    InvalidRecipient,

    /// The caller lacks the permission the operation requires.
    #[error("unauthorized: {caller} may not perform this operation")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Minting would push the supply or a balance past `u128::MAX`.
    #[error("supply overflow: minting {amount} would exceed u128::MAX")]
    SupplyOverflow {
        /// The amount that was attempted.
        amount: Amount,
    },

    /// The asset refused the call for its own reasons (custom hooks).
    #[error("asset rejected the call: {reason}")]
    Rejected {
        /// Free-form explanation from the asset.
        reason: String,
    },
}

/// A fungible asset contract deployed on the ledger.
///
/// Implementations use interior mutability: contracts are shared as
/// `Arc<dyn FungibleAsset>`, and a transfer may run hook code that calls
/// back into other contracts before returning.
pub trait FungibleAsset: Send + Sync {
    /// The address this asset is deployed at.
    fn address(&self) -> Address;

    /// Balance held by `owner`; zero for unknown accounts.
    fn balance_of(&self, owner: Address) -> Amount;

    /// Remaining amount `spender` may move out of `owner`'s balance.
    fn allowance(&self, owner: Address, spender: Address) -> Amount;

    /// Sets `spender`'s allowance over `owner`'s balance to `amount`.
    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), AssetError>;

    /// Moves `amount` from `caller` to `to`.
    fn transfer(&self, caller: Address, to: Address, amount: Amount) -> Result<(), AssetError>;

    /// Moves `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), AssetError>;
}
