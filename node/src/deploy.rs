//! # Manifest Execution
//!
//! Runs a [`Manifest`] against a fresh in-memory ledger in a fixed order:
//!
//! 1. seed native balances
//! 2. deploy the authority and make the deployer its ADMIN
//! 3. appoint operators
//! 4. issue tokens
//! 5. deploy and initialize vaults
//! 6. mint token allocations
//! 7. grant vault allowances
//! 8. make the initial deposits
//!
//! The first failing step aborts the run with context naming the step.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;

use aegis_contracts::{
    AccessAuthority, AuthoritySnapshot, GovernedToken, NativeVault, TokenVault, VaultSnapshot,
};
use aegis_protocol::{Address, Amount, FungibleAsset, Ledger, RoleId};

use crate::manifest::{Manifest, VaultKind};

/// A deployed vault of either flavour.
#[derive(Debug, Clone)]
pub enum DeployedVault {
    Token(Arc<TokenVault>),
    Native(Arc<NativeVault>),
}

impl DeployedVault {
    pub fn address(&self) -> Address {
        match self {
            DeployedVault::Token(vault) => vault.address(),
            DeployedVault::Native(vault) => vault.address(),
        }
    }

    pub fn kind(&self) -> VaultKind {
        match self {
            DeployedVault::Token(_) => VaultKind::Token,
            DeployedVault::Native(_) => VaultKind::Native,
        }
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        match self {
            DeployedVault::Token(vault) => vault.snapshot(),
            DeployedVault::Native(vault) => vault.snapshot(),
        }
    }
}

/// Everything a manifest run produced.
#[derive(Debug)]
pub struct Deployment {
    pub deployer: Address,
    pub ledger: Arc<Ledger>,
    pub authority: Arc<AccessAuthority>,
    /// Keyed by symbol.
    pub tokens: BTreeMap<String, Arc<GovernedToken>>,
    /// Keyed by label.
    pub vaults: BTreeMap<String, DeployedVault>,
}

/// Executes `manifest` on a new ledger.
pub fn execute(manifest: &Manifest) -> Result<Deployment> {
    manifest.validate()?;
    let ledger = Arc::new(Ledger::new());
    let deployer = manifest.deployer;

    for account in &manifest.accounts {
        ledger
            .fund(account.address, account.native)
            .with_context(|| format!("failed to fund {}", account.address))?;
    }

    let authority =
        AccessAuthority::deploy(&ledger, deployer).context("failed to deploy authority")?;
    authority
        .init(deployer)
        .context("failed to initialize authority")?;
    if !manifest.operators.is_empty() {
        authority
            .grant_roles(deployer, RoleId::operator(), &manifest.operators)
            .context("failed to appoint operators")?;
    }

    let mut tokens = BTreeMap::new();
    for spec in &manifest.tokens {
        let token = GovernedToken::deploy(
            &ledger,
            deployer,
            &spec.name,
            &spec.symbol,
            authority.clone(),
        )
        .with_context(|| format!("failed to deploy token {}", spec.symbol))?;
        tokens.insert(spec.symbol.clone(), token);
    }

    let mut vaults = BTreeMap::new();
    for spec in &manifest.vaults {
        let vault = match spec.kind {
            VaultKind::Token => {
                let symbol = spec
                    .asset
                    .as_deref()
                    .ok_or_else(|| anyhow!("token vault {:?} must name an asset", spec.label))?;
                let token = tokens
                    .get(symbol)
                    .ok_or_else(|| anyhow!("vault {:?} tracks unknown token {symbol:?}", spec.label))?;
                let vault = TokenVault::deploy(&ledger, deployer);
                vault
                    .init(authority.address(), token.address())
                    .with_context(|| format!("failed to initialize vault {}", spec.label))?;
                DeployedVault::Token(vault)
            }
            VaultKind::Native => {
                let vault = NativeVault::deploy(&ledger, deployer);
                vault
                    .init(authority.address())
                    .with_context(|| format!("failed to initialize vault {}", spec.label))?;
                DeployedVault::Native(vault)
            }
        };
        info!(label = %spec.label, address = %vault.address(), "vault ready");
        vaults.insert(spec.label.clone(), vault);
    }

    for spec in &manifest.tokens {
        let token = tokens
            .get(&spec.symbol)
            .ok_or_else(|| anyhow!("token {} was not deployed", spec.symbol))?;
        for mint in &spec.mints {
            token
                .mint(deployer, mint.to, mint.amount)
                .with_context(|| format!("failed to mint {} {} to {}", mint.amount, spec.symbol, mint.to))?;
        }
    }

    for approval in &manifest.approvals {
        let Some(DeployedVault::Token(vault)) = vaults.get(&approval.vault) else {
            return Err(anyhow!("approval targets {:?}, which is not a token vault", approval.vault));
        };
        let asset = vault
            .asset()
            .and_then(|address| ledger.asset(address))
            .ok_or_else(|| anyhow!("vault {} has no resolvable asset", approval.vault))?;
        asset
            .approve(approval.owner, vault.address(), approval.amount)
            .with_context(|| format!("failed to approve {} for {}", approval.vault, approval.owner))?;
    }

    for deposit in &manifest.deposits {
        let vault = vaults
            .get(&deposit.vault)
            .ok_or_else(|| anyhow!("deposit targets unknown vault {:?}", deposit.vault))?;
        let outcome = match vault {
            DeployedVault::Token(vault) => vault.deposit(deposit.depositor, deposit.amount),
            DeployedVault::Native(vault) => vault.deposit(deposit.depositor, deposit.amount),
        };
        outcome.with_context(|| {
            format!(
                "failed to deposit {} into {} for {}",
                deposit.amount, deposit.vault, deposit.depositor
            )
        })?;
    }

    info!(
        authority = %authority.address(),
        tokens = tokens.len(),
        vaults = vaults.len(),
        "deployment complete"
    );

    Ok(Deployment {
        deployer,
        ledger,
        authority,
        tokens,
        vaults,
    })
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The JSON document printed by `aegis-node deploy`.
#[derive(Debug, Serialize)]
pub struct DeploymentReport {
    pub deployer: Address,
    pub native_supply: Amount,
    pub authority: AuthoritySnapshot,
    pub tokens: BTreeMap<String, TokenReport>,
    pub vaults: BTreeMap<String, VaultReport>,
}

#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub address: Address,
    pub name: String,
    pub decimals: u8,
    pub total_supply: Amount,
}

#[derive(Debug, Serialize)]
pub struct VaultReport {
    pub kind: VaultKind,
    #[serde(flatten)]
    pub state: VaultSnapshot,
}

impl Deployment {
    pub fn report(&self) -> DeploymentReport {
        DeploymentReport {
            deployer: self.deployer,
            native_supply: self.ledger.native_supply(),
            authority: self.authority.snapshot(),
            tokens: self
                .tokens
                .iter()
                .map(|(symbol, token)| {
                    let report = TokenReport {
                        address: token.address(),
                        name: token.name().to_string(),
                        decimals: token.decimals(),
                        total_supply: token.total_supply(),
                    };
                    (symbol.clone(), report)
                })
                .collect(),
            vaults: self
                .vaults
                .iter()
                .map(|(label, vault)| {
                    let report = VaultReport {
                        kind: vault.kind(),
                        state: vault.snapshot(),
                    };
                    (label.clone(), report)
                })
                .collect(),
        }
    }
}
