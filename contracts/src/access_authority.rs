//! # Access Authority Contract
//!
//! The single arbiter of permission decisions for every vault and token that
//! points at it. It keeps three pieces of shared state:
//!
//! - **Role membership**: `RoleId -> {Address}`. Roles are flat; ADMIN does
//!   not imply OPERATOR.
//! - **The pause switch**: one global halt flag.
//! - **The blacklist**: addresses barred from depositing.
//!
//! Only ADMIN holders can mutate any of it. Reads are open to everyone,
//! which is how vaults consume it (through the [`Authority`] trait).
//!
//! ## Lifecycle
//!
//! [`AccessAuthority::new`] builds an inert instance with no admins.
//! [`AccessAuthority::init`] grants ADMIN to the initial administrator and
//! can run exactly once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use aegis_protocol::{Address, Authority, Ledger, LedgerError, RoleId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the access authority.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The caller does not hold the role the operation requires.
    #[error("unauthorized: {caller} does not hold role {role}")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
        /// The role that was required.
        role: RoleId,
    },

    /// `init` was called on an authority that is already initialized.
    #[error("authority is already initialized")]
    AlreadyInitialized,

    /// `has_roles` was given sequences of different lengths.
    #[error("length mismatch: {roles} roles vs {accounts} accounts")]
    LengthMismatch {
        /// Number of roles supplied.
        roles: usize,
        /// Number of accounts supplied.
        accounts: usize,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct AuthorityState {
    initialized: bool,
    roles: HashMap<RoleId, HashSet<Address>>,
    paused: bool,
    blacklist: HashSet<Address>,
}

impl AuthorityState {
    fn holds(&self, role: &RoleId, account: Address) -> bool {
        self.roles
            .get(role)
            .is_some_and(|members| members.contains(&account))
    }

    fn ensure_admin(&self, caller: Address) -> Result<(), AccessError> {
        let admin = RoleId::admin();
        if self.holds(&admin, caller) {
            Ok(())
        } else {
            debug!(caller = %caller, "admin check failed");
            Err(AccessError::Unauthorized {
                caller,
                role: admin,
            })
        }
    }
}

/// Observable state of an authority, for reports and persistence.
///
/// Member lists are sorted so two snapshots of equal state serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritySnapshot {
    /// Where the authority is deployed.
    pub address: Address,
    /// Whether `init` has run.
    pub initialized: bool,
    /// The pause switch.
    pub paused: bool,
    /// Non-empty role memberships.
    pub roles: BTreeMap<RoleId, Vec<Address>>,
    /// Blacklisted addresses.
    pub blacklist: Vec<Address>,
}

/// The role registry, pause switch, and blacklist shared by many vaults.
#[derive(Debug)]
pub struct AccessAuthority {
    address: Address,
    state: RwLock<AuthorityState>,
}

impl AccessAuthority {
    /// Builds an inert authority at `address`. Nobody holds any role until
    /// [`init`](Self::init) runs.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: RwLock::new(AuthorityState::default()),
        }
    }

    /// Allocates an address for `deployer`, builds an inert authority there
    /// and publishes it in the ledger's directory.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AddressInUse`] if the allocated address is
    /// already taken.
    pub fn deploy(ledger: &Ledger, deployer: Address) -> Result<Arc<Self>, LedgerError> {
        let authority = Arc::new(Self::new(ledger.allocate_address(deployer)));
        ledger.register_authority(authority.clone())?;
        info!(address = %authority.address, deployer = %deployer, "authority deployed");
        Ok(authority)
    }

    /// The address this authority is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// One-time initialization: grants ADMIN to `initial_admin`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AlreadyInitialized`] on every call after the
    /// first.
    pub fn init(&self, initial_admin: Address) -> Result<(), AccessError> {
        let mut state = self.state.write();
        if state.initialized {
            return Err(AccessError::AlreadyInitialized);
        }
        state
            .roles
            .entry(RoleId::admin())
            .or_default()
            .insert(initial_admin);
        state.initialized = true;
        info!(authority = %self.address, admin = %initial_admin, "authority initialized");
        Ok(())
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: &RoleId, account: Address) -> bool {
        self.state.read().holds(role, account)
    }

    /// Pairwise lookup: `result[i] = has_role(roles[i], accounts[i])`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::LengthMismatch`] if the slices differ in length.
    pub fn has_roles(&self, roles: &[RoleId], accounts: &[Address]) -> Result<Vec<bool>, AccessError> {
        if roles.len() != accounts.len() {
            return Err(AccessError::LengthMismatch {
                roles: roles.len(),
                accounts: accounts.len(),
            });
        }
        let state = self.state.read();
        Ok(roles
            .iter()
            .zip(accounts)
            .map(|(role, account)| state.holds(role, *account))
            .collect())
    }

    /// Adds every account in `accounts` to `role`. Already-held roles are
    /// left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn grant_roles(
        &self,
        caller: Address,
        role: RoleId,
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        let mut state = self.state.write();
        state.ensure_admin(caller)?;
        let members = state.roles.entry(role).or_default();
        for account in accounts {
            members.insert(*account);
        }
        info!(authority = %self.address, role = %role, count = accounts.len(), "roles granted");
        Ok(())
    }

    /// Removes every account in `accounts` from `role`. Absent members are
    /// ignored. An admin may revoke its own ADMIN role.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn revoke_roles(
        &self,
        caller: Address,
        role: RoleId,
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        let mut state = self.state.write();
        state.ensure_admin(caller)?;
        let emptied = match state.roles.get_mut(&role) {
            Some(members) => {
                for account in accounts {
                    members.remove(account);
                }
                members.is_empty()
            }
            None => false,
        };
        if emptied {
            state.roles.remove(&role);
        }
        info!(authority = %self.address, role = %role, count = accounts.len(), "roles revoked");
        Ok(())
    }

    /// Engages the pause switch. Pausing while paused is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn pause(&self, caller: Address) -> Result<(), AccessError> {
        self.set_paused(caller, true)
    }

    /// Releases the pause switch. Unpausing while active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn unpause(&self, caller: Address) -> Result<(), AccessError> {
        self.set_paused(caller, false)
    }

    fn set_paused(&self, caller: Address, paused: bool) -> Result<(), AccessError> {
        let mut state = self.state.write();
        state.ensure_admin(caller)?;
        if state.paused != paused {
            state.paused = paused;
            info!(authority = %self.address, paused, by = %caller, "pause switch changed");
        }
        Ok(())
    }

    /// Whether the pause switch is engaged.
    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    /// Adds `accounts` to the blacklist.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn add_blacklist_users(&self, caller: Address, accounts: &[Address]) -> Result<(), AccessError> {
        let mut state = self.state.write();
        state.ensure_admin(caller)?;
        state.blacklist.extend(accounts.iter().copied());
        info!(authority = %self.address, count = accounts.len(), "accounts blacklisted");
        Ok(())
    }

    /// Removes `accounts` from the blacklist.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds ADMIN.
    pub fn remove_blacklist_users(
        &self,
        caller: Address,
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        let mut state = self.state.write();
        state.ensure_admin(caller)?;
        for account in accounts {
            state.blacklist.remove(account);
        }
        info!(authority = %self.address, count = accounts.len(), "accounts removed from blacklist");
        Ok(())
    }

    /// Whether `account` is blacklisted.
    pub fn is_blacklisted(&self, account: Address) -> bool {
        self.state.read().blacklist.contains(&account)
    }

    /// Current members of `role`, sorted.
    pub fn members(&self, role: &RoleId) -> Vec<Address> {
        let state = self.state.read();
        let mut members: Vec<Address> = state
            .roles
            .get(role)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Captures the authority's observable state.
    pub fn snapshot(&self) -> AuthoritySnapshot {
        let state = self.state.read();
        let roles = state
            .roles
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(role, members)| {
                let mut sorted: Vec<Address> = members.iter().copied().collect();
                sorted.sort();
                (*role, sorted)
            })
            .collect();
        let mut blacklist: Vec<Address> = state.blacklist.iter().copied().collect();
        blacklist.sort();
        AuthoritySnapshot {
            address: self.address,
            initialized: state.initialized,
            paused: state.paused,
            roles,
            blacklist,
        }
    }
}

impl Authority for AccessAuthority {
    fn address(&self) -> Address {
        self.address
    }

    fn has_role(&self, role: &RoleId, account: Address) -> bool {
        AccessAuthority::has_role(self, role, account)
    }

    fn is_paused(&self) -> bool {
        AccessAuthority::is_paused(self)
    }

    fn is_blacklisted(&self, account: Address) -> bool {
        AccessAuthority::is_blacklisted(self, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::from_label("admin")
    }

    fn user() -> Address {
        Address::from_label("user")
    }

    fn initialized() -> AccessAuthority {
        let authority = AccessAuthority::new(Address::from_label("authority"));
        authority.init(admin()).unwrap();
        authority
    }

    #[test]
    fn inert_authority_has_no_admins() {
        let authority = AccessAuthority::new(Address::from_label("authority"));
        assert!(!authority.is_initialized());
        assert!(!authority.has_role(&RoleId::admin(), admin()));
        assert!(authority.pause(admin()).is_err());
    }

    #[test]
    fn init_grants_admin() {
        let authority = initialized();
        assert!(authority.is_initialized());
        assert!(authority.has_role(&RoleId::admin(), admin()));
        assert!(!authority.has_role(&RoleId::admin(), user()));
    }

    #[test]
    fn second_init_rejected() {
        let authority = initialized();
        assert_eq!(authority.init(user()), Err(AccessError::AlreadyInitialized));
        assert!(!authority.has_role(&RoleId::admin(), user()));
    }

    #[test]
    fn revoking_last_role_member_drops_role_from_snapshot() {
        let authority = initialized();
        authority
            .grant_roles(admin(), RoleId::operator(), &[user()])
            .unwrap();
        assert_eq!(authority.snapshot().roles.len(), 2);
        authority
            .revoke_roles(admin(), RoleId::operator(), &[user()])
            .unwrap();
        let snapshot = authority.snapshot();
        assert_eq!(snapshot.roles.len(), 1);
        assert_eq!(snapshot.roles[&RoleId::admin()], vec![admin()]);
    }

    #[test]
    fn pause_is_idempotent() {
        let authority = initialized();
        authority.pause(admin()).unwrap();
        authority.pause(admin()).unwrap();
        assert!(authority.is_paused());
        authority.unpause(admin()).unwrap();
        authority.unpause(admin()).unwrap();
        assert!(!authority.is_paused());
    }

    #[test]
    fn trait_view_matches_inherent_methods() {
        let authority = initialized();
        authority.add_blacklist_users(admin(), &[user()]).unwrap();
        let view: &dyn Authority = &authority;
        assert!(view.is_blacklisted(user()));
        assert!(view.has_any_role(&[RoleId::operator(), RoleId::admin()], admin()));
        assert!(!view.has_any_role(&[RoleId::operator()], admin()));
    }
}
