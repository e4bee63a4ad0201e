//! # Authority Interface
//!
//! The read side of an access authority, as seen by the contracts it
//! governs. Vaults hold an `Arc<dyn Authority>` and ask it every
//! authorization question; they never mutate it. The mutating side (role
//! grants, pause, blacklist) lives on the concrete authority contract and is
//! reachable only by its own administrators.

use crate::types::{Address, RoleId};

/// Read-only view of role membership, the pause switch, and the blacklist.
pub trait Authority: Send + Sync {
    /// The address this authority is deployed at.
    fn address(&self) -> Address;

    /// Whether `account` holds `role`.
    fn has_role(&self, role: &RoleId, account: Address) -> bool;

    /// Whether the global halt switch is engaged.
    fn is_paused(&self) -> bool;

    /// Whether `account` is excluded from deposits.
    fn is_blacklisted(&self, account: Address) -> bool;

    /// Whether `account` holds at least one of `roles`.
    fn has_any_role(&self, roles: &[RoleId], account: Address) -> bool {
        roles.iter().any(|role| self.has_role(role, account))
    }
}
