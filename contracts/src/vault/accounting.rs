//! # Vault Accounting Core
//!
//! [`Vault<T>`] is the ledger shared by every vault flavour. It tracks each
//! user's deposit and the custodied total, delegates every authorization
//! question to its authority, and hands the physical value movement to an
//! [`AssetTransfer`].
//!
//! ## Call discipline
//!
//! Every mutating entry point runs in the same order:
//!
//! 1. **Checks**: initialized, not paused, not blacklisted (deposits only),
//!    argument validation, role checks.
//! 2. **Ledger mutation** under the state lock, balance and total together.
//! 3. **External transfer** with the state lock released.
//!
//! The transfer may run foreign code that calls straight back into this
//! vault. By then the ledger already reflects the withdrawal, so a second
//! withdrawal of the same funds fails with `InsufficientBalance`. If the
//! transfer itself fails, the ledger mutation is reversed before the error
//! is returned.
//!
//! Deposits are the exception to step order: value is pulled first and
//! credited after, so a depositor is never credited for funds that did not
//! arrive.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use aegis_protocol::{Address, Amount, Authority, Ledger, RoleId};

use super::harvest::{HarvestContext, HarvestStrategy, Unharvestable};
use super::transfer::{AssetTransfer, FungibleTransfer, NativeTransfer, TransferError};
use super::VaultError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct VaultState<T> {
    initialized: bool,
    authority: Option<Arc<dyn Authority>>,
    transfer: Option<Arc<T>>,
    balances: HashMap<Address, Amount>,
    total_custodied: Amount,
}

impl<T> VaultState<T> {
    fn inert() -> Self {
        Self {
            initialized: false,
            authority: None,
            transfer: None,
            balances: HashMap::new(),
            total_custodied: 0,
        }
    }

    fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }
}

/// Observable state of a vault, for reports and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Where the vault is deployed.
    pub address: Address,
    /// Whether `init` has run.
    pub initialized: bool,
    /// The authority currently governing the vault (zero before `init`).
    pub administrator: Address,
    /// The tracked fungible asset, `None` for native currency.
    pub asset: Option<Address>,
    /// Total custodied amount of the tracked asset.
    pub total_custodied: Amount,
    /// Non-zero user deposits.
    pub balances: BTreeMap<Address, Amount>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A custodial vault over one tracked asset.
///
/// Build with [`new`](Self::new) (inert), then `init` exactly once. Shared
/// as `Arc<Vault<T>>`; all methods take `&self`.
pub struct Vault<T: AssetTransfer> {
    address: Address,
    ledger: Arc<Ledger>,
    harvester: Arc<dyn HarvestStrategy>,
    state: RwLock<VaultState<T>>,
}

impl<T: AssetTransfer> Vault<T> {
    /// Builds an inert vault at `address` with the default
    /// [`Unharvestable`] strategy.
    pub fn new(address: Address, ledger: Arc<Ledger>) -> Self {
        Self::with_harvest_strategy(address, ledger, Arc::new(Unharvestable))
    }

    /// Builds an inert vault at `address` whose `harvest` delegates to
    /// `harvester`.
    pub fn with_harvest_strategy(
        address: Address,
        ledger: Arc<Ledger>,
        harvester: Arc<dyn HarvestStrategy>,
    ) -> Self {
        Self {
            address,
            ledger,
            harvester,
            state: RwLock::new(VaultState::inert()),
        }
    }

    /// Allocates an address for `deployer` and builds an inert vault there.
    pub fn deploy(ledger: &Arc<Ledger>, deployer: Address) -> Arc<Self> {
        let vault = Arc::new(Self::new(ledger.allocate_address(deployer), ledger.clone()));
        info!(address = %vault.address, deployer = %deployer, "vault deployed");
        vault
    }

    /// One-time initialization with an already-built transfer capability.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AlreadyInitialized`] on every call after the first.
    /// - [`VaultError::InvalidAddress`] if `authority` is zero or not a
    ///   deployed authority.
    pub fn init_with(&self, authority: Address, transfer: T) -> Result<(), VaultError> {
        self.ensure_uninitialized()?;
        let authority = self.resolve_authority(authority)?;
        let asset = transfer.tracked_asset();

        let mut state = self.state.write();
        if state.initialized {
            return Err(VaultError::AlreadyInitialized);
        }
        let administrator = authority.address();
        state.authority = Some(authority);
        state.transfer = Some(Arc::new(transfer));
        state.initialized = true;

        info!(
            vault = %self.address,
            administrator = %administrator,
            asset = ?asset,
            "vault initialized"
        );
        Ok(())
    }

    fn ensure_uninitialized(&self) -> Result<(), VaultError> {
        if self.state.read().initialized {
            Err(VaultError::AlreadyInitialized)
        } else {
            Ok(())
        }
    }

    fn resolve_authority(&self, address: Address) -> Result<Arc<dyn Authority>, VaultError> {
        if address.is_zero() {
            return Err(VaultError::InvalidAddress { address });
        }
        self.ledger
            .authority(address)
            .ok_or(VaultError::InvalidAddress { address })
    }

    fn context(&self) -> Result<(Arc<dyn Authority>, Arc<T>), VaultError> {
        let state = self.state.read();
        match (&state.authority, &state.transfer) {
            (Some(authority), Some(transfer)) => Ok((authority.clone(), transfer.clone())),
            _ => Err(VaultError::NotInitialized),
        }
    }

    fn ensure_admin(authority: &dyn Authority, caller: Address) -> Result<(), VaultError> {
        let admin = RoleId::admin();
        if authority.has_role(&admin, caller) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                caller,
                role: admin,
            })
        }
    }

    fn ensure_operator(authority: &dyn Authority, caller: Address) -> Result<(), VaultError> {
        let operator = RoleId::operator();
        if authority.has_any_role(&[operator, RoleId::admin()], caller) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized {
                caller,
                role: operator,
            })
        }
    }

    // -- deposits -----------------------------------------------------------

    /// Deposits `amount` of the tracked asset from `caller`, credited to
    /// `caller`.
    ///
    /// # Errors
    ///
    /// In check order: [`VaultError::NotInitialized`], [`VaultError::Paused`],
    /// [`VaultError::Blacklisted`], [`VaultError::InvalidAmount`]. A failed
    /// pull surfaces as [`VaultError::TransferFailed`]. A credit that would
    /// overflow is refunded and fails with [`VaultError::AmountOverflow`],
    /// or with [`VaultError::DepositStranded`] if the refund fails.
    pub fn deposit(&self, caller: Address, amount: Amount) -> Result<(), VaultError> {
        self.deposit_to(caller, caller, amount)
    }

    /// Deposits `amount` from `caller`, credited to `beneficiary`.
    ///
    /// The caller pays and is the one subject to the pause and blacklist
    /// checks; a blacklisted beneficiary is refused too.
    ///
    /// # Errors
    ///
    /// As [`deposit`](Self::deposit), plus [`VaultError::InvalidAddress`]
    /// (checked after the blacklist) if `beneficiary` is the zero address.
    pub fn deposit_for(
        &self,
        caller: Address,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<(), VaultError> {
        self.deposit_to(caller, beneficiary, amount)
    }

    fn deposit_to(
        &self,
        payer: Address,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<(), VaultError> {
        let (authority, transfer) = self.context()?;
        if authority.is_paused() {
            return Err(VaultError::Paused);
        }
        for account in [payer, beneficiary] {
            if authority.is_blacklisted(account) {
                debug!(vault = %self.address, account = %account, "deposit refused: blacklisted");
                return Err(VaultError::Blacklisted { account });
            }
        }
        if beneficiary.is_zero() {
            return Err(VaultError::InvalidAddress {
                address: beneficiary,
            });
        }
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }

        transfer.pull(payer, self.address, amount)?;

        if let Err(err) = self.credit(beneficiary, amount) {
            if let Err(refund) = transfer.push(self.address, payer, amount) {
                warn!(
                    vault = %self.address,
                    payer = %payer,
                    amount,
                    error = %refund,
                    "refund of uncredited deposit failed"
                );
                return Err(VaultError::DepositStranded { payer, amount });
            }
            return Err(err);
        }

        info!(
            vault = %self.address,
            payer = %payer,
            beneficiary = %beneficiary,
            amount,
            "deposit"
        );
        Ok(())
    }

    fn credit(&self, account: Address, amount: Amount) -> Result<(), VaultError> {
        let mut state = self.state.write();
        let balance = state
            .balance_of(account)
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        let total = state
            .total_custodied
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        state.balances.insert(account, balance);
        state.total_custodied = total;
        Ok(())
    }

    // -- withdrawals --------------------------------------------------------

    /// Withdraws `amount` of `caller`'s deposit back to `caller`.
    ///
    /// The blacklist does not apply here.
    ///
    /// # Errors
    ///
    /// In check order: [`VaultError::NotInitialized`], [`VaultError::Paused`],
    /// [`VaultError::InvalidAmount`], [`VaultError::InsufficientBalance`]. A
    /// failed payout surfaces as [`VaultError::TransferFailed`] with the
    /// ledger restored.
    pub fn withdraw(&self, caller: Address, amount: Amount) -> Result<(), VaultError> {
        let (authority, transfer) = self.context()?;
        if authority.is_paused() {
            return Err(VaultError::Paused);
        }
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        self.pay_out(transfer.as_ref(), caller, amount)
    }

    /// Withdraws `caller`'s entire deposit and returns the amount paid out.
    ///
    /// # Errors
    ///
    /// [`VaultError::Paused`] while paused, [`VaultError::InsufficientBalance`]
    /// if the caller has nothing deposited, otherwise as
    /// [`withdraw`](Self::withdraw).
    pub fn withdraw_all(&self, caller: Address) -> Result<Amount, VaultError> {
        let (authority, transfer) = self.context()?;
        if authority.is_paused() {
            return Err(VaultError::Paused);
        }
        let amount = self.balance_of(caller);
        if amount == 0 {
            return Err(VaultError::InsufficientBalance {
                account: caller,
                available: 0,
                requested: 0,
            });
        }
        self.pay_out(transfer.as_ref(), caller, amount)?;
        Ok(amount)
    }

    fn pay_out(&self, transfer: &T, recipient: Address, amount: Amount) -> Result<(), VaultError> {
        self.debit(recipient, amount)?;

        if let Err(err) = transfer.push(self.address, recipient, amount) {
            self.restore(recipient, amount);
            warn!(
                vault = %self.address,
                account = %recipient,
                amount,
                error = %err,
                "payout failed, ledger restored"
            );
            return Err(err.into());
        }

        info!(vault = %self.address, account = %recipient, amount, "withdrawal");
        Ok(())
    }

    fn debit(&self, account: Address, amount: Amount) -> Result<(), VaultError> {
        let mut state = self.state.write();
        let available = state.balance_of(account);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                account,
                available,
                requested: amount,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            state.balances.remove(&account);
        } else {
            state.balances.insert(account, remaining);
        }
        state.total_custodied = state.total_custodied.saturating_sub(amount);
        Ok(())
    }

    fn restore(&self, account: Address, amount: Amount) {
        let mut state = self.state.write();
        let balance = state.balance_of(account).saturating_add(amount);
        state.balances.insert(account, balance);
        state.total_custodied = state.total_custodied.saturating_add(amount);
    }

    // -- governance ---------------------------------------------------------

    /// Repoints the vault at another deployed authority. Balances are
    /// untouched.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Unauthorized`] unless `caller` holds ADMIN on the
    ///   *current* authority.
    /// - [`VaultError::InvalidAddress`] if `new_authority` is zero or not a
    ///   deployed authority.
    pub fn set_administrator(&self, caller: Address, new_authority: Address) -> Result<(), VaultError> {
        let (current, _) = self.context()?;
        Self::ensure_admin(current.as_ref(), caller)?;
        let resolved = self.resolve_authority(new_authority)?;

        self.state.write().authority = Some(resolved);
        info!(
            vault = %self.address,
            from = %current.address(),
            to = %new_authority,
            by = %caller,
            "administrator changed"
        );
        Ok(())
    }

    /// Transfers `amount` of a foreign asset held by the vault to `to`.
    ///
    /// Never touches user balances or the custodied total.
    ///
    /// # Errors
    ///
    /// In check order: [`VaultError::Unauthorized`] (OPERATOR or ADMIN
    /// required), [`VaultError::InvalidAmount`], [`VaultError::InvalidAddress`]
    /// (zero `to` or `token`), [`VaultError::SelfAssetRescueForbidden`].
    /// An unknown token or a rejected transfer surfaces as
    /// [`VaultError::TransferFailed`].
    pub fn rescue(
        &self,
        caller: Address,
        token: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), VaultError> {
        let (authority, transfer) = self.context()?;
        Self::ensure_operator(authority.as_ref(), caller)?;
        if amount == 0 {
            return Err(VaultError::InvalidAmount);
        }
        for address in [to, token] {
            if address.is_zero() {
                return Err(VaultError::InvalidAddress { address });
            }
        }
        if transfer.tracked_asset() == Some(token) {
            warn!(vault = %self.address, caller = %caller, "rescue of tracked asset refused");
            return Err(VaultError::SelfAssetRescueForbidden { asset: token });
        }

        let asset = self
            .ledger
            .asset(token)
            .ok_or(TransferError::UnknownAsset(token))?;
        asset
            .transfer(self.address, to, amount)
            .map_err(TransferError::from)?;

        info!(
            vault = %self.address,
            token = %token,
            to = %to,
            amount,
            by = %caller,
            "foreign asset rescued"
        );
        Ok(())
    }

    /// Runs the injected harvest strategy and books what it claimed into the
    /// custodied total. Returns the claimed amount.
    ///
    /// # Errors
    ///
    /// [`VaultError::Unauthorized`] unless `caller` holds OPERATOR or ADMIN;
    /// [`VaultError::NotImplemented`] from the default strategy; anything
    /// the strategy itself returns.
    pub fn harvest(&self, caller: Address) -> Result<Amount, VaultError> {
        let (authority, transfer) = self.context()?;
        Self::ensure_operator(authority.as_ref(), caller)?;

        let claimed = self.harvester.harvest(HarvestContext {
            vault: self.address,
            asset: transfer.tracked_asset(),
            ledger: &self.ledger,
        })?;

        if claimed > 0 {
            let mut state = self.state.write();
            state.total_custodied = state
                .total_custodied
                .checked_add(claimed)
                .ok_or(VaultError::AmountOverflow)?;
        }
        info!(vault = %self.address, claimed, by = %caller, "harvested");
        Ok(claimed)
    }

    // -- views --------------------------------------------------------------

    /// The address this vault is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Total custodied amount of the tracked asset.
    pub fn balance(&self) -> Amount {
        self.state.read().total_custodied
    }

    /// `account`'s tracked deposit.
    pub fn balance_of(&self, account: Address) -> Amount {
        self.state.read().balance_of(account)
    }

    /// The governing authority's address; zero before `init`.
    pub fn administrator(&self) -> Address {
        self.state
            .read()
            .authority
            .as_ref()
            .map(|a| a.address())
            .unwrap_or(Address::ZERO)
    }

    /// The tracked fungible asset; `None` for native currency or before
    /// `init`.
    pub fn asset(&self) -> Option<Address> {
        self.state
            .read()
            .transfer
            .as_ref()
            .and_then(|t| t.tracked_asset())
    }

    /// Captures the vault's observable state.
    pub fn snapshot(&self) -> VaultSnapshot {
        let state = self.state.read();
        VaultSnapshot {
            address: self.address,
            initialized: state.initialized,
            administrator: state
                .authority
                .as_ref()
                .map(|a| a.address())
                .unwrap_or(Address::ZERO),
            asset: state.transfer.as_ref().and_then(|t| t.tracked_asset()),
            total_custodied: state.total_custodied,
            balances: state
                .balances
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(account, amount)| (*account, *amount))
                .collect(),
        }
    }
}

impl Vault<FungibleTransfer> {
    /// One-time initialization of a token-backed vault.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AlreadyInitialized`] on every call after the first.
    /// - [`VaultError::InvalidAddress`] if `asset` or `authority` is zero or
    ///   does not resolve to a deployed contract.
    pub fn init(&self, authority: Address, asset: Address) -> Result<(), VaultError> {
        self.ensure_uninitialized()?;
        if asset.is_zero() {
            return Err(VaultError::InvalidAddress { address: asset });
        }
        let resolved = self
            .ledger
            .asset(asset)
            .ok_or(VaultError::InvalidAddress { address: asset })?;
        self.init_with(authority, FungibleTransfer::new(resolved))
    }
}

impl Vault<NativeTransfer> {
    /// One-time initialization of a native-currency vault.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AlreadyInitialized`] on every call after the first.
    /// - [`VaultError::InvalidAddress`] if `authority` is zero or not a
    ///   deployed authority.
    pub fn init(&self, authority: Address) -> Result<(), VaultError> {
        let transfer = NativeTransfer::new(self.ledger.clone());
        self.init_with(authority, transfer)
    }
}

impl<T: AssetTransfer> std::fmt::Debug for Vault<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("initialized", &state.initialized)
            .field("accounts", &state.balances.len())
            .field("total_custodied", &state.total_custodied)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
