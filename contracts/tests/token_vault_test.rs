//! Integration tests for the token-backed vault.
//!
//! Each test deploys a full stack on a fresh ledger: an authority, a
//! governed token, and a vault tracking it. Users are minted a starting
//! balance and approve the vault up front, the way a wallet would.

use std::sync::Arc;

use aegis_contracts::access_authority::AccessAuthority;
use aegis_contracts::token::GovernedToken;
use aegis_contracts::vault::{TokenVault, TransferError, VaultError};
use aegis_protocol::{Address, AssetError, FungibleAsset, Ledger, RoleId};

const STARTING_BALANCE: u128 = 10_000;

fn admin() -> Address {
    Address::from_label("admin")
}

fn operator() -> Address {
    Address::from_label("operator")
}

fn alice() -> Address {
    Address::from_label("alice")
}

fn bob() -> Address {
    Address::from_label("bob")
}

fn treasury() -> Address {
    Address::from_label("treasury")
}

struct Fixture {
    ledger: Arc<Ledger>,
    authority: Arc<AccessAuthority>,
    token: Arc<GovernedToken>,
    vault: Arc<TokenVault>,
}

/// Helper: authority + wETH + vault, with alice and bob funded and approved.
fn fixture() -> Fixture {
    let ledger = Arc::new(Ledger::new());
    let authority = AccessAuthority::deploy(&ledger, admin()).unwrap();
    authority.init(admin()).unwrap();
    authority
        .grant_roles(admin(), RoleId::operator(), &[operator()])
        .unwrap();

    let token =
        GovernedToken::deploy(&ledger, admin(), "Wrapped ETH", "wETH", authority.clone()).unwrap();
    let vault = TokenVault::deploy(&ledger, admin());
    vault.init(authority.address(), token.address()).unwrap();

    for user in [alice(), bob()] {
        token.mint(operator(), user, STARTING_BALANCE).unwrap();
        token.approve(user, vault.address(), u128::MAX).unwrap();
    }

    Fixture {
        ledger,
        authority,
        token,
        vault,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle Tests
// ---------------------------------------------------------------------------

#[test]
fn fresh_vault_is_empty() {
    let f = fixture();
    assert_eq!(f.vault.balance(), 0);
    for account in [alice(), bob(), admin(), Address::ZERO] {
        assert_eq!(f.vault.balance_of(account), 0);
    }
    assert_eq!(f.vault.asset(), Some(f.token.address()));
    assert_eq!(f.vault.administrator(), f.authority.address());
}

#[test]
fn second_init_rejected() {
    let f = fixture();
    assert_eq!(
        f.vault.init(f.authority.address(), f.token.address()),
        Err(VaultError::AlreadyInitialized)
    );
}

#[test]
fn init_rejects_zero_and_unknown_asset() {
    let f = fixture();
    let vault = TokenVault::deploy(&f.ledger, admin());
    assert_eq!(
        vault.init(f.authority.address(), Address::ZERO),
        Err(VaultError::InvalidAddress {
            address: Address::ZERO
        })
    );
    let stray = Address::from_label("not-a-token");
    assert_eq!(
        vault.init(f.authority.address(), stray),
        Err(VaultError::InvalidAddress { address: stray })
    );
    assert!(!vault.is_initialized());
    assert_eq!(vault.deposit(alice(), 1), Err(VaultError::NotInitialized));
}

// ---------------------------------------------------------------------------
// Deposit / Withdraw Tests
// ---------------------------------------------------------------------------

#[test]
fn deposit_then_withdraw_all() {
    let f = fixture();
    f.vault.deposit(alice(), 1_000).unwrap();
    assert_eq!(f.vault.balance_of(alice()), 1_000);
    assert_eq!(f.vault.balance(), 1_000);
    assert_eq!(f.token.balance_of(f.vault.address()), 1_000);
    assert_eq!(f.token.balance_of(alice()), STARTING_BALANCE - 1_000);

    assert_eq!(f.vault.withdraw_all(alice()), Ok(1_000));
    assert_eq!(f.vault.balance_of(alice()), 0);
    assert_eq!(f.vault.balance(), 0);
    assert_eq!(f.token.balance_of(alice()), STARTING_BALANCE);
}

#[test]
fn partial_withdrawals() {
    let f = fixture();
    f.vault.deposit(alice(), 900).unwrap();
    f.vault.withdraw(alice(), 300).unwrap();
    f.vault.withdraw(alice(), 300).unwrap();
    assert_eq!(f.vault.balance_of(alice()), 300);
    assert_eq!(f.vault.balance(), 300);
}

#[test]
fn withdraw_beyond_balance_rejected() {
    let f = fixture();
    f.vault.deposit(alice(), 100).unwrap();
    assert_eq!(
        f.vault.withdraw(alice(), 101),
        Err(VaultError::InsufficientBalance {
            account: alice(),
            available: 100,
            requested: 101,
        })
    );
    assert_eq!(f.vault.balance_of(alice()), 100);
}

#[test]
fn withdraw_all_with_nothing_deposited_rejected() {
    let f = fixture();
    assert!(matches!(
        f.vault.withdraw_all(bob()),
        Err(VaultError::InsufficientBalance { available: 0, .. })
    ));
}

#[test]
fn zero_amounts_rejected() {
    let f = fixture();
    assert_eq!(f.vault.deposit(alice(), 0), Err(VaultError::InvalidAmount));
    assert_eq!(f.vault.withdraw(alice(), 0), Err(VaultError::InvalidAmount));
}

#[test]
fn deposit_without_allowance_fails_cleanly() {
    let f = fixture();
    let carol = Address::from_label("carol");
    f.token.mint(operator(), carol, 500).unwrap();

    let err = f.vault.deposit(carol, 500).unwrap_err();
    assert!(matches!(
        err,
        VaultError::TransferFailed(TransferError::Asset(AssetError::InsufficientAllowance { .. }))
    ));
    assert_eq!(f.vault.balance_of(carol), 0);
    assert_eq!(f.vault.balance(), 0);
    assert_eq!(f.token.balance_of(carol), 500);
}

#[test]
fn deposit_for_credits_beneficiary() {
    let f = fixture();
    f.vault.deposit_for(alice(), bob(), 400).unwrap();
    assert_eq!(f.vault.balance_of(bob()), 400);
    assert_eq!(f.vault.balance_of(alice()), 0);
    assert_eq!(f.token.balance_of(alice()), STARTING_BALANCE - 400);

    // Only the beneficiary can take it out.
    assert!(f.vault.withdraw(alice(), 400).is_err());
    f.vault.withdraw(bob(), 400).unwrap();
    assert_eq!(f.token.balance_of(bob()), STARTING_BALANCE + 400);
}

#[test]
fn deposit_for_validates_arguments() {
    let f = fixture();
    assert_eq!(
        f.vault.deposit_for(alice(), Address::ZERO, 1_000),
        Err(VaultError::InvalidAddress {
            address: Address::ZERO
        })
    );
    assert_eq!(
        f.vault.deposit_for(alice(), bob(), 0),
        Err(VaultError::InvalidAmount)
    );
    assert_eq!(f.vault.balance(), 0);
}

#[test]
fn ledger_sum_matches_total() {
    let f = fixture();
    f.vault.deposit(alice(), 1_250).unwrap();
    f.vault.deposit(bob(), 3_000).unwrap();
    f.vault.deposit_for(bob(), alice(), 50).unwrap();
    f.vault.withdraw(bob(), 1_000).unwrap();

    let snapshot = f.vault.snapshot();
    let sum: u128 = snapshot.balances.values().sum();
    assert_eq!(sum, f.vault.balance());
    assert_eq!(f.vault.balance(), 3_300);
    assert_eq!(f.token.balance_of(f.vault.address()), 3_300);
}

// ---------------------------------------------------------------------------
// Pause Tests
// ---------------------------------------------------------------------------

#[test]
fn pause_blocks_every_user_operation() {
    let f = fixture();
    f.vault.deposit(alice(), 500).unwrap();
    f.authority.pause(admin()).unwrap();

    assert_eq!(f.vault.deposit(alice(), 1_000), Err(VaultError::Paused));
    assert_eq!(f.vault.deposit_for(alice(), bob(), 1_000), Err(VaultError::Paused));
    assert_eq!(f.vault.withdraw(alice(), 100), Err(VaultError::Paused));
    assert_eq!(f.vault.withdraw_all(alice()), Err(VaultError::Paused));
    assert_eq!(f.vault.balance_of(alice()), 500);

    f.authority.unpause(admin()).unwrap();
    f.vault.deposit(alice(), 1_000).unwrap();
    assert_eq!(f.vault.balance_of(alice()), 1_500);
}

#[test]
fn pause_is_checked_before_arguments() {
    let f = fixture();
    f.authority.pause(admin()).unwrap();
    assert_eq!(f.vault.deposit(alice(), 0), Err(VaultError::Paused));
    assert_eq!(
        f.vault.deposit_for(alice(), Address::ZERO, 0),
        Err(VaultError::Paused)
    );
}

// ---------------------------------------------------------------------------
// Blacklist Tests
// ---------------------------------------------------------------------------

#[test]
fn blacklisted_account_cannot_deposit() {
    let f = fixture();
    f.authority.add_blacklist_users(admin(), &[alice()]).unwrap();

    assert_eq!(
        f.vault.deposit(alice(), 1_000),
        Err(VaultError::Blacklisted { account: alice() })
    );
    assert_eq!(
        f.vault.deposit_for(alice(), bob(), 1_000),
        Err(VaultError::Blacklisted { account: alice() })
    );
    assert_eq!(
        f.vault.deposit_for(bob(), alice(), 1_000),
        Err(VaultError::Blacklisted { account: alice() })
    );
    assert_eq!(f.vault.balance(), 0);
}

#[test]
fn blacklisted_account_can_still_withdraw() {
    let f = fixture();
    f.vault.deposit(alice(), 700).unwrap();
    f.authority.add_blacklist_users(admin(), &[alice()]).unwrap();

    f.vault.withdraw(alice(), 200).unwrap();
    assert_eq!(f.vault.withdraw_all(alice()), Ok(500));
    assert_eq!(f.token.balance_of(alice()), STARTING_BALANCE);
}

// ---------------------------------------------------------------------------
// Rescue Tests
// ---------------------------------------------------------------------------

#[test]
fn rescue_of_tracked_asset_forbidden_for_every_role() {
    let f = fixture();
    f.vault.deposit(alice(), 1_000).unwrap();
    for caller in [admin(), operator()] {
        assert_eq!(
            f.vault.rescue(caller, f.token.address(), treasury(), 1_000),
            Err(VaultError::SelfAssetRescueForbidden {
                asset: f.token.address()
            })
        );
    }
    assert_eq!(f.token.balance_of(f.vault.address()), 1_000);
}

#[test]
fn operator_rescues_foreign_token() {
    let f = fixture();
    f.vault.deposit(alice(), 1_000).unwrap();

    let dai = GovernedToken::deploy(&f.ledger, admin(), "Dai", "DAI", f.authority.clone()).unwrap();
    dai.mint(operator(), f.vault.address(), 250).unwrap();

    f.vault
        .rescue(operator(), dai.address(), treasury(), 250)
        .unwrap();
    assert_eq!(dai.balance_of(treasury()), 250);
    assert_eq!(dai.balance_of(f.vault.address()), 0);
    assert_eq!(f.vault.balance(), 1_000);
    assert_eq!(f.vault.balance_of(alice()), 1_000);
}

#[test]
fn admin_may_rescue_too() {
    let f = fixture();
    let dai = GovernedToken::deploy(&f.ledger, admin(), "Dai", "DAI", f.authority.clone()).unwrap();
    dai.mint(operator(), f.vault.address(), 10).unwrap();
    f.vault.rescue(admin(), dai.address(), treasury(), 10).unwrap();
    assert_eq!(dai.balance_of(treasury()), 10);
}

#[test]
fn rescue_rejections() {
    let f = fixture();
    let dai = GovernedToken::deploy(&f.ledger, admin(), "Dai", "DAI", f.authority.clone()).unwrap();
    dai.mint(operator(), f.vault.address(), 10).unwrap();

    assert!(matches!(
        f.vault.rescue(alice(), dai.address(), alice(), 10),
        Err(VaultError::Unauthorized { .. })
    ));
    assert_eq!(
        f.vault.rescue(operator(), dai.address(), treasury(), 0),
        Err(VaultError::InvalidAmount)
    );
    assert_eq!(
        f.vault.rescue(operator(), dai.address(), Address::ZERO, 10),
        Err(VaultError::InvalidAddress {
            address: Address::ZERO
        })
    );
    assert!(matches!(
        f.vault.rescue(operator(), dai.address(), treasury(), 11),
        Err(VaultError::TransferFailed(TransferError::Asset(
            AssetError::InsufficientBalance { .. }
        )))
    ));

    let stray = Address::from_label("nothing-here");
    assert_eq!(
        f.vault.rescue(operator(), stray, treasury(), 1),
        Err(VaultError::TransferFailed(TransferError::UnknownAsset(stray)))
    );
    assert_eq!(dai.balance_of(f.vault.address()), 10);
}

// ---------------------------------------------------------------------------
// Administrator Tests
// ---------------------------------------------------------------------------

#[test]
fn set_administrator_switches_governance() {
    let f = fixture();
    f.vault.deposit(alice(), 600).unwrap();

    let successor_admin = Address::from_label("successor");
    let successor = AccessAuthority::deploy(&f.ledger, successor_admin).unwrap();
    successor.init(successor_admin).unwrap();

    f.vault
        .set_administrator(admin(), successor.address())
        .unwrap();
    assert_eq!(f.vault.administrator(), successor.address());
    assert_eq!(f.vault.balance_of(alice()), 600);

    // The old authority's pause switch no longer matters.
    f.authority.pause(admin()).unwrap();
    f.vault.deposit(alice(), 1).unwrap();

    // The new one does.
    successor.pause(successor_admin).unwrap();
    assert_eq!(f.vault.deposit(alice(), 1), Err(VaultError::Paused));

    // And only its admin may move governance again.
    assert!(matches!(
        f.vault.set_administrator(admin(), f.authority.address()),
        Err(VaultError::Unauthorized { .. })
    ));
}

#[test]
fn set_administrator_rejections() {
    let f = fixture();
    assert!(matches!(
        f.vault.set_administrator(operator(), f.authority.address()),
        Err(VaultError::Unauthorized { .. })
    ));
    assert_eq!(
        f.vault.set_administrator(admin(), Address::ZERO),
        Err(VaultError::InvalidAddress {
            address: Address::ZERO
        })
    );
    let stray = Address::from_label("stray");
    assert_eq!(
        f.vault.set_administrator(admin(), stray),
        Err(VaultError::InvalidAddress { address: stray })
    );
    assert_eq!(f.vault.administrator(), f.authority.address());
}

// ---------------------------------------------------------------------------
// Snapshot Tests
// ---------------------------------------------------------------------------

#[test]
fn snapshot_round_trips_through_json() {
    let f = fixture();
    f.vault.deposit(alice(), 10).unwrap();
    f.vault.deposit(bob(), 20).unwrap();

    let snapshot = f.vault.snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["total_custodied"], 30);
    assert_eq!(json["asset"], f.token.address().to_hex());

    let decoded: aegis_contracts::VaultSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, snapshot);
}
