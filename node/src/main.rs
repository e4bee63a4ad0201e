// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # AEGIS Node
//!
//! Entry point for the `aegis-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `deploy`   execute a deployment manifest and print the report
//! - `roles`    print the well-known role identifiers
//! - `version`  print build version information

mod cli;
mod deploy;
mod logging;
mod manifest;

use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;

use aegis_protocol::config::{ADMIN_ROLE_LABEL, OPERATOR_ROLE_LABEL};
use aegis_protocol::RoleId;

use cli::{AegisNodeCli, Commands, DeployArgs};
use manifest::Manifest;

fn main() -> Result<()> {
    let cli = AegisNodeCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format.into());

    match cli.command {
        Commands::Deploy(args) => run_deploy(args),
        Commands::Roles => print_roles(),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the manifest, executes it and writes the report to stdout.
fn run_deploy(args: DeployArgs) -> Result<()> {
    tracing::info!(manifest = %args.manifest.display(), "executing deployment manifest");
    let manifest = Manifest::load(&args.manifest)?;
    let deployment = deploy::execute(&manifest)?;
    let report = deployment.report();

    let rendered = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to render deployment report")?;
    write_stdout(&rendered)
}

fn print_roles() -> Result<()> {
    let roles: BTreeMap<&str, String> = [
        (ADMIN_ROLE_LABEL, RoleId::admin().to_hex()),
        (OPERATOR_ROLE_LABEL, RoleId::operator().to_hex()),
    ]
    .into_iter()
    .collect();
    let rendered = serde_json::to_string_pretty(&roles).context("failed to render roles")?;
    write_stdout(&rendered)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").context("failed to write to stdout")?;
    stdout.flush().context("failed to flush stdout")
}

fn print_version() {
    println!("aegis-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
