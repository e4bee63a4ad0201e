//! # Harvest Extension Point
//!
//! Claiming external yield is strategy-specific, so the vault core does not
//! do it. It holds an injected [`HarvestStrategy`] and, after the OPERATOR
//! check, asks it to claim. Whatever the strategy reports as claimed is
//! added to the vault's custodied total; individual balances are untouched.
//!
//! The default, [`Unharvestable`], always fails with
//! [`VaultError::NotImplemented`].

use aegis_protocol::{Address, Amount, Ledger};

use super::VaultError;

/// What a strategy can see while harvesting.
#[derive(Debug, Clone, Copy)]
pub struct HarvestContext<'a> {
    /// The harvesting vault's address (where claimed rewards should land).
    pub vault: Address,
    /// The vault's tracked asset, `None` for native currency.
    pub asset: Option<Address>,
    /// The host ledger.
    pub ledger: &'a Ledger,
}

/// Claims external rewards on behalf of a vault.
pub trait HarvestStrategy: Send + Sync {
    /// Claims rewards into `ctx.vault` and returns the amount of tracked
    /// asset claimed.
    fn harvest(&self, ctx: HarvestContext<'_>) -> Result<Amount, VaultError>;
}

/// The core's strategy: there is nothing to harvest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unharvestable;

impl HarvestStrategy for Unharvestable {
    fn harvest(&self, _ctx: HarvestContext<'_>) -> Result<Amount, VaultError> {
        Err(VaultError::NotImplemented)
    }
}
