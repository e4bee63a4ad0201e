//! # Host Ledger
//!
//! An in-memory stand-in for the chain the contracts are deployed on. It
//! owns three things no single contract can:
//!
//! 1. **Native currency balances.** Every address has one; value moves with
//!    [`Ledger::transfer_native`].
//! 2. **The contract directory.** Contracts refer to each other by
//!    [`Address`]; the directory resolves an address to the deployed
//!    `Arc<dyn FungibleAsset>` or `Arc<dyn Authority>`.
//! 3. **Address allocation.** New contracts get `CREATE`-style addresses:
//!    the trailing 20 bytes of `keccak256(deployer || nonce)`.
//!
//! ## Receive hooks
//!
//! An address may register a [`NativeReceiver`]. It runs *after* value has
//! landed, exactly like a contract's receive function, which means it can
//! call back into whatever contract just paid it. If the hook returns an
//! error the transfer is clawed back and reported as
//! [`LedgerError::ReceiverRejected`], unless the hook already moved the value
//! on, in which case the transfer stands.
//!
//! No lock is held while a hook runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use crate::asset::FungibleAsset;
use crate::authority::Authority;
use crate::crypto::hash::keccak256_multi;
use crate::types::{Address, Amount};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from native transfers and directory registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The sender's native balance does not cover the transfer.
    #[error("insufficient native balance: {account} holds {balance}, requested {requested}")]
    InsufficientNative {
        /// The account being debited.
        account: Address,
        /// Its current native balance.
        balance: Amount,
        /// The amount that was requested.
        requested: Amount,
    },

    /// Crediting would push a balance past `u128::MAX`.
    #[error("native balance overflow for {account}")]
    BalanceOverflow {
        /// The account being credited.
        account: Address,
    },

    /// Native value cannot be sent to the null address.
    #[error("invalid recipient: the zero address cannot receive native value")]
    InvalidRecipient,

    /// The recipient's receive hook refused the value.
    #[error("receiver {recipient} rejected native transfer: {reason}")]
    ReceiverRejected {
        /// The recipient whose hook failed.
        recipient: Address,
        /// The hook's explanation.
        reason: String,
    },

    /// A contract is already registered at this address.
    #[error("address already in use: {0}")]
    AddressInUse(Address),
}

// ---------------------------------------------------------------------------
// Receive hooks
// ---------------------------------------------------------------------------

/// Code that runs when native value arrives at an address.
pub trait NativeReceiver: Send + Sync {
    /// Called after `amount` from `from` has been credited. Returning `Err`
    /// reverts the transfer.
    fn on_native_received(&self, from: Address, amount: Amount) -> Result<(), String>;
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The hosting chain: native balances, contract directory, address space.
///
/// Shared as `Arc<Ledger>` between every contract deployed on it.
#[derive(Default)]
pub struct Ledger {
    native: RwLock<HashMap<Address, Amount>>,
    nonces: Mutex<HashMap<Address, u64>>,
    assets: RwLock<HashMap<Address, Arc<dyn FungibleAsset>>>,
    authorities: RwLock<HashMap<Address, Arc<dyn Authority>>>,
    receivers: RwLock<HashMap<Address, Arc<dyn NativeReceiver>>>,
}

impl Ledger {
    /// Creates an empty ledger: no balances, no contracts.
    pub fn new() -> Self {
        Self::default()
    }

    // -- native currency ----------------------------------------------------

    /// Native balance of `account`; zero if it has never been credited.
    pub fn native_balance(&self, account: Address) -> Amount {
        self.native.read().get(&account).copied().unwrap_or(0)
    }

    /// Sum of every native balance on the ledger.
    pub fn native_supply(&self) -> Amount {
        self.native
            .read()
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    /// Credits freshly created native value to `account` (genesis
    /// allocation, faucet). Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BalanceOverflow`] if the credit would overflow.
    pub fn fund(&self, account: Address, amount: Amount) -> Result<Amount, LedgerError> {
        let mut native = self.native.write();
        let balance = native.entry(account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account })?;
        debug!(account = %account, amount, "native value funded");
        Ok(*balance)
    }

    /// Moves native value from `from` to `to`, then runs `to`'s receive
    /// hook if one is registered.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidRecipient`] if `to` is the zero address.
    /// - [`LedgerError::InsufficientNative`] if `from` cannot cover `amount`.
    /// - [`LedgerError::BalanceOverflow`] if `to` would overflow.
    /// - [`LedgerError::ReceiverRejected`] if the hook fails; the value is
    ///   returned to `from` first. A hook that already moved the value on
    ///   cannot be undone, so its rejection is ignored and the transfer
    ///   counts as delivered.
    pub fn transfer_native(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }

        self.move_native(from, to, amount)?;

        let receiver = self.receivers.read().get(&to).cloned();
        if let Some(receiver) = receiver {
            if let Err(reason) = receiver.on_native_received(from, amount) {
                if self.claw_back(to, from, amount) {
                    return Err(LedgerError::ReceiverRejected {
                        recipient: to,
                        reason,
                    });
                }
                warn!(
                    recipient = %to,
                    amount,
                    reason = %reason,
                    "receiver moved the value on before rejecting it; transfer stands"
                );
            }
        }

        Ok(())
    }

    fn move_native(&self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        let mut native = self.native.write();
        let available = native.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientNative {
                account: from,
                balance: available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = native
            .get(&to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { account: to })?;
        native.insert(from, available - amount);
        native.insert(to, credited);
        Ok(())
    }

    /// Reverses a transfer whose receive hook failed. Returns `false`,
    /// leaving balances untouched, if `holder` no longer holds the full
    /// `amount`: a transfer is either undone completely or not at all.
    fn claw_back(&self, holder: Address, owner: Address, amount: Amount) -> bool {
        let mut native = self.native.write();
        let held = native.get(&holder).copied().unwrap_or(0);
        if held < amount {
            return false;
        }
        native.insert(holder, held - amount);
        let restored = native.entry(owner).or_insert(0);
        *restored = restored.saturating_add(amount);
        true
    }

    /// Registers a receive hook for `account`, replacing any previous one.
    pub fn set_receiver(&self, account: Address, receiver: Arc<dyn NativeReceiver>) {
        self.receivers.write().insert(account, receiver);
    }

    /// Removes `account`'s receive hook, if any.
    pub fn clear_receiver(&self, account: Address) {
        self.receivers.write().remove(&account);
    }

    // -- address space ------------------------------------------------------

    /// Allocates the next contract address for `deployer`.
    ///
    /// Deterministic: the n-th allocation by a given deployer always yields
    /// the same address on every ledger.
    pub fn allocate_address(&self, deployer: Address) -> Address {
        let nonce = {
            let mut nonces = self.nonces.lock();
            let next = nonces.entry(deployer).or_insert(0);
            let current = *next;
            *next += 1;
            current
        };
        let digest = keccak256_multi(&[deployer.as_bytes(), &nonce.to_be_bytes()]);
        Address::from_digest(&digest)
    }

    /// Whether any contract is registered at `address`.
    pub fn is_contract(&self, address: Address) -> bool {
        self.assets.read().contains_key(&address) || self.authorities.read().contains_key(&address)
    }

    // -- contract directory -------------------------------------------------

    /// Publishes a fungible asset at its own address.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AddressInUse`] if a contract already lives there.
    pub fn register_asset(&self, asset: Arc<dyn FungibleAsset>) -> Result<(), LedgerError> {
        let address = asset.address();
        if self.is_contract(address) {
            return Err(LedgerError::AddressInUse(address));
        }
        self.assets.write().insert(address, asset);
        debug!(address = %address, "asset registered");
        Ok(())
    }

    /// Resolves a fungible asset by address.
    pub fn asset(&self, address: Address) -> Option<Arc<dyn FungibleAsset>> {
        self.assets.read().get(&address).cloned()
    }

    /// Publishes an authority at its own address.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AddressInUse`] if a contract already lives there.
    pub fn register_authority(&self, authority: Arc<dyn Authority>) -> Result<(), LedgerError> {
        let address = authority.address();
        if self.is_contract(address) {
            return Err(LedgerError::AddressInUse(address));
        }
        self.authorities.write().insert(address, authority);
        debug!(address = %address, "authority registered");
        Ok(())
    }

    /// Resolves an authority by address.
    pub fn authority(&self, address: Address) -> Option<Arc<dyn Authority>> {
        self.authorities.read().get(&address).cloned()
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("accounts", &self.native.read().len())
            .field("assets", &self.assets.read().len())
            .field("authorities", &self.authorities.read().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
