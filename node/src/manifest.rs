//! # Deployment Manifest
//!
//! The JSON document `aegis-node deploy` executes. It names the deployer,
//! seeds native balances, lists the operators to appoint, the tokens to
//! issue, the vaults to stand up, the allowances users grant those vaults,
//! and the deposits made once everything is in place.
//!
//! ```json
//! {
//!   "deployer": "0x…",
//!   "accounts":  [{ "address": "0x…", "native": 1000 }],
//!   "operators": ["0x…"],
//!   "tokens":    [{ "name": "Wrapped ETH", "symbol": "wETH",
//!                   "mints": [{ "to": "0x…", "amount": 500 }] }],
//!   "vaults":    [{ "label": "weth-vault", "kind": "token", "asset": "wETH" },
//!                 { "label": "eth-vault", "kind": "native" }],
//!   "approvals": [{ "owner": "0x…", "vault": "weth-vault", "amount": 500 }],
//!   "deposits":  [{ "depositor": "0x…", "vault": "weth-vault", "amount": 500 }]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use aegis_protocol::{Address, Amount};

/// A complete deployment description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Deploys every contract and becomes the authority's first ADMIN.
    pub deployer: Address,
    /// Native currency allocated before anything is deployed.
    #[serde(default)]
    pub accounts: Vec<AccountAllocation>,
    /// Accounts granted OPERATOR.
    #[serde(default)]
    pub operators: Vec<Address>,
    /// Governed tokens to issue.
    #[serde(default)]
    pub tokens: Vec<TokenSpec>,
    /// Vaults to deploy and initialize.
    #[serde(default)]
    pub vaults: Vec<VaultSpec>,
    /// Allowances granted to token vaults.
    #[serde(default)]
    pub approvals: Vec<ApprovalSpec>,
    /// Deposits made after approvals, in order.
    #[serde(default)]
    pub deposits: Vec<DepositSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountAllocation {
    pub address: Address,
    pub native: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub mints: Vec<MintSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MintSpec {
    pub to: Address,
    pub amount: Amount,
}

/// Which asset a vault custodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultKind {
    /// A governed token, named by `asset`.
    Token,
    /// The ledger's native currency.
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultSpec {
    /// Unique name the report and approvals refer to.
    pub label: String,
    pub kind: VaultKind,
    /// Token symbol; required for `token` vaults, forbidden for `native`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalSpec {
    pub owner: Address,
    /// Label of a token vault.
    pub vault: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepositSpec {
    pub depositor: Address,
    /// Label of any vault.
    pub vault: String,
    pub amount: Amount,
}

impl Manifest {
    /// Reads, parses and validates the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid manifest {}", path.display()))
    }

    /// Parses and validates a manifest from JSON text.
    pub fn parse(raw: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(raw).context("malformed manifest JSON")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks cross-references: unique symbols and labels, token vaults
    /// naming an issued token, approvals naming a token vault, deposits
    /// naming a vault.
    pub fn validate(&self) -> Result<()> {
        if self.deployer.is_zero() {
            bail!("deployer must not be the zero address");
        }

        let mut symbols = HashSet::new();
        for token in &self.tokens {
            if !symbols.insert(token.symbol.as_str()) {
                bail!("duplicate token symbol {:?}", token.symbol);
            }
        }

        let mut token_vaults = HashSet::new();
        let mut labels = HashSet::new();
        for vault in &self.vaults {
            if !labels.insert(vault.label.as_str()) {
                bail!("duplicate vault label {:?}", vault.label);
            }
            match (vault.kind, vault.asset.as_deref()) {
                (VaultKind::Token, Some(symbol)) if symbols.contains(symbol) => {
                    token_vaults.insert(vault.label.as_str());
                }
                (VaultKind::Token, Some(symbol)) => {
                    bail!("vault {:?} tracks unknown token {:?}", vault.label, symbol)
                }
                (VaultKind::Token, None) => {
                    bail!("token vault {:?} must name an asset", vault.label)
                }
                (VaultKind::Native, Some(_)) => {
                    bail!("native vault {:?} must not name an asset", vault.label)
                }
                (VaultKind::Native, None) => {}
            }
        }

        for approval in &self.approvals {
            if !token_vaults.contains(approval.vault.as_str()) {
                bail!(
                    "approval for {} targets {:?}, which is not a token vault",
                    approval.owner,
                    approval.vault
                );
            }
        }

        for deposit in &self.deposits {
            if !labels.contains(deposit.vault.as_str()) {
                bail!(
                    "deposit by {} targets unknown vault {:?}",
                    deposit.depositor,
                    deposit.vault
                );
            }
        }
        Ok(())
    }
}
