//! # CLI Interface
//!
//! Defines the command-line argument structure for `aegis-node` using
//! `clap` derive. Supports three subcommands: `deploy`, `roles`, and
//! `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// AEGIS custody deployment runner.
///
/// Executes a JSON deployment manifest (authority, tokens, vaults, initial
/// balances) against an in-memory ledger and prints the resulting state.
#[derive(Parser, Debug)]
#[command(
    name = "aegis-node",
    about = "AEGIS custody deployment runner",
    version,
    propagate_version = true
)]
pub struct AegisNodeCli {
    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "AEGIS_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "AEGIS_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the AEGIS node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a deployment manifest and print the deployment report.
    Deploy(DeployArgs),
    /// Print the well-known role identifiers.
    Roles,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `deploy` subcommand.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    /// Path to the deployment manifest (JSON).
    #[arg(long, short = 'm', env = "AEGIS_MANIFEST")]
    pub manifest: PathBuf,

    /// Emit the report as compact single-line JSON.
    #[arg(long)]
    pub compact: bool,
}

/// `--log-format` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable output.
    Pretty,
    /// JSON lines.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        AegisNodeCli::command().debug_assert();
    }

    #[test]
    fn deploy_parses_manifest_and_globals() {
        let cli = AegisNodeCli::try_parse_from([
            "aegis-node",
            "deploy",
            "--manifest",
            "deploy.json",
            "--log-format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormatArg::Json);
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.manifest, PathBuf::from("deploy.json"));
                assert!(!args.compact);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn deploy_requires_manifest() {
        std::env::remove_var("AEGIS_MANIFEST");
        assert!(AegisNodeCli::try_parse_from(["aegis-node", "deploy"]).is_err());
    }
}
