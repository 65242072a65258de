//! `info` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::resolve_config;

const REDACTED: &str = "<redacted>";

/// Execute the `info` command
///
/// Prints the effective configuration (file, defaults and overrides merged)
/// with the token redacted.
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref(), &args.overrides)?;
    if !config.endpoint.auth_token.is_empty() {
        config.endpoint.auth_token = REDACTED.to_string();
    }

    info!(json = args.json, "Rendering effective configuration");

    let rendered = if args.json {
        config_loader::ConfigLoader::to_json(&config)
    } else {
        config_loader::ConfigLoader::to_toml(&config)
    }
    .context("Failed to render configuration")?;

    println!("{}", rendered);
    Ok(())
}
