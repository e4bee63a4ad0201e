//! # Governed Token Contract
//!
//! A plain ERC20-style fungible asset whose minting is gated by an access
//! authority: only OPERATOR (or ADMIN) holders may create supply. This is
//! the asset deployments wrap into token-backed vaults, and the "foreign"
//! asset operators rescue when someone sends it to the wrong contract.
//!
//! ## Security Model
//!
//! - **Mint gating**: `mint()` asks the authority whether the caller holds
//!   OPERATOR or ADMIN.
//! - **No admin transfers**: balances only move through `transfer` by their
//!   owner or `transfer_from` by an approved spender.
//! - **Supply tracking**: total supply and per-address balances are updated
//!   under one lock, with overflow checked on every credit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use aegis_protocol::config::TOKEN_DECIMALS;
use aegis_protocol::{Address, Amount, AssetError, Authority, FungibleAsset, Ledger, LedgerError, RoleId};

#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenState {
    fn balance(&self, owner: Address) -> Amount {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), AssetError> {
        if to.is_zero() {
            return Err(AssetError::InvalidRecipient);
        }
        let available = self.balance(from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                owner: from,
                balance: available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        // Cannot overflow: the sum of all balances is the total supply.
        let credited = self.balance(to) + amount;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }
}

/// An authority-governed fungible token.
pub struct GovernedToken {
    address: Address,
    name: String,
    symbol: String,
    authority: Arc<dyn Authority>,
    state: RwLock<TokenState>,
}

impl GovernedToken {
    /// Creates a token with zero supply at `address`, governed by `authority`.
    pub fn new(address: Address, name: &str, symbol: &str, authority: Arc<dyn Authority>) -> Self {
        Self {
            address,
            name: name.to_string(),
            symbol: symbol.to_string(),
            authority,
            state: RwLock::new(TokenState::default()),
        }
    }

    /// Allocates an address for `deployer`, creates the token there and
    /// publishes it in the ledger's asset directory.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AddressInUse`] if the allocated address is
    /// already taken.
    pub fn deploy(
        ledger: &Ledger,
        deployer: Address,
        name: &str,
        symbol: &str,
        authority: Arc<dyn Authority>,
    ) -> Result<Arc<Self>, LedgerError> {
        let token = Arc::new(Self::new(ledger.allocate_address(deployer), name, symbol, authority));
        ledger.register_asset(token.clone())?;
        info!(address = %token.address, symbol, "token deployed");
        Ok(token)
    }

    /// Human-readable name, e.g. "Wrapped ETH".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ticker symbol, e.g. "wETH".
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Decimal places (display only).
    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    /// Current total supply in base units.
    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    /// The authority gating `mint`.
    pub fn authority(&self) -> Address {
        self.authority.address()
    }

    /// Creates `amount` new tokens in `to`'s balance.
    ///
    /// # Errors
    ///
    /// - [`AssetError::Unauthorized`] unless `caller` holds OPERATOR or ADMIN.
    /// - [`AssetError::InvalidRecipient`] if `to` is the zero address.
    /// - [`AssetError::SupplyOverflow`] if the supply would overflow.
    pub fn mint(&self, caller: Address, to: Address, amount: Amount) -> Result<(), AssetError> {
        if !self
            .authority
            .has_any_role(&[RoleId::operator(), RoleId::admin()], caller)
        {
            return Err(AssetError::Unauthorized { caller });
        }
        if to.is_zero() {
            return Err(AssetError::InvalidRecipient);
        }

        let mut state = self.state.write();
        let total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(AssetError::SupplyOverflow { amount })?;
        let credited = state
            .balance(to)
            .checked_add(amount)
            .ok_or(AssetError::SupplyOverflow { amount })?;
        state.total_supply = total_supply;
        state.balances.insert(to, credited);

        info!(token = %self.symbol, to = %to, amount, "minted");
        Ok(())
    }
}

impl FungibleAsset for GovernedToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: Address) -> Amount {
        self.state.read().balance(owner)
    }

    fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), AssetError> {
        if spender.is_zero() {
            return Err(AssetError::InvalidRecipient);
        }
        self.state.write().allowances.insert((owner, spender), amount);
        debug!(token = %self.symbol, owner = %owner, spender = %spender, amount, "approval set");
        Ok(())
    }

    fn transfer(&self, caller: Address, to: Address, amount: Amount) -> Result<(), AssetError> {
        self.state.write().move_balance(caller, to, amount)?;
        debug!(token = %self.symbol, from = %caller, to = %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let mut state = self.state.write();
        let allowance = state
            .allowances
            .get(&(from, spender))
            .copied()
            .unwrap_or(0);
        if allowance < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: from,
                spender,
                allowance,
                requested: amount,
            });
        }
        state.move_balance(from, to, amount)?;
        state.allowances.insert((from, spender), allowance - amount);
        debug!(token = %self.symbol, spender = %spender, from = %from, to = %to, amount, "transfer_from");
        Ok(())
    }
}

impl std::fmt::Debug for GovernedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernedToken")
            .field("address", &self.address)
            .field("symbol", &self.symbol)
            .field("total_supply", &self.total_supply())
            .finish()
    }
}
