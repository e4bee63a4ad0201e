//! # Asset Transfer Capability
//!
//! The only place a vault touches actual value. The accounting core decides
//! *how much* moves and *for whom*; an [`AssetTransfer`] decides *how*:
//!
//! - [`FungibleTransfer`] pulls with `transfer_from` (the depositor must have
//!   approved the vault) and pays out with `transfer`.
//! - [`NativeTransfer`] moves native currency on the host ledger, which runs
//!   the recipient's receive hook on payout.
//!
//! Either way the call may execute foreign code before it returns.

use std::sync::Arc;

use thiserror::Error;

use aegis_protocol::{Address, Amount, AssetError, FungibleAsset, Ledger, LedgerError};

/// Why value failed to move.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The fungible asset rejected the call.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// The host ledger rejected a native transfer.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// No fungible asset is deployed at the given address.
    #[error("no asset deployed at {0}")]
    UnknownAsset(Address),
}

/// Moves the tracked asset between users and a vault.
pub trait AssetTransfer: Send + Sync {
    /// The tracked fungible asset, or `None` for native currency.
    fn tracked_asset(&self) -> Option<Address>;

    /// Moves `amount` from `from` into `vault`.
    fn pull(&self, from: Address, vault: Address, amount: Amount) -> Result<(), TransferError>;

    /// Moves `amount` from `vault` out to `to`.
    fn push(&self, vault: Address, to: Address, amount: Amount) -> Result<(), TransferError>;
}

/// Transfer capability backed by a fungible asset contract.
pub struct FungibleTransfer {
    asset: Arc<dyn FungibleAsset>,
}

impl FungibleTransfer {
    /// Wraps a deployed fungible asset.
    pub fn new(asset: Arc<dyn FungibleAsset>) -> Self {
        Self { asset }
    }

    /// The wrapped asset.
    pub fn asset(&self) -> &Arc<dyn FungibleAsset> {
        &self.asset
    }
}

impl AssetTransfer for FungibleTransfer {
    fn tracked_asset(&self) -> Option<Address> {
        Some(self.asset.address())
    }

    fn pull(&self, from: Address, vault: Address, amount: Amount) -> Result<(), TransferError> {
        self.asset.transfer_from(vault, from, vault, amount)?;
        Ok(())
    }

    fn push(&self, vault: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        self.asset.transfer(vault, to, amount)?;
        Ok(())
    }
}

/// Transfer capability backed by the host ledger's native currency.
pub struct NativeTransfer {
    ledger: Arc<Ledger>,
}

impl NativeTransfer {
    /// Moves native value on `ledger`.
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }
}

impl AssetTransfer for NativeTransfer {
    fn tracked_asset(&self) -> Option<Address> {
        None
    }

    fn pull(&self, from: Address, vault: Address, amount: Amount) -> Result<(), TransferError> {
        self.ledger.transfer_native(from, vault, amount)?;
        Ok(())
    }

    fn push(&self, vault: Address, to: Address, amount: Amount) -> Result<(), TransferError> {
        self.ledger.transfer_native(vault, to, amount)?;
        Ok(())
    }
}
