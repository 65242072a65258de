//! Command implementations.

mod info;
mod send;
mod validate;

pub use info::run_info;
pub use send::run_send;
pub use validate::run_validate;

use std::path::Path;

use contracts::LoaderConfig;
use tracing::info;

use crate::cli::ConfigOverrides;
use crate::error::{CliError, Result};

/// Load the configuration file (or defaults), apply overrides, re-validate
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<LoaderConfig> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)?
        }
        None => LoaderConfig::default(),
    };

    apply_overrides(&mut config, overrides);
    config_loader::ConfigLoader::validate(&config)?;
    Ok(config)
}

fn apply_overrides(config: &mut LoaderConfig, overrides: &ConfigOverrides) {
    if let Some(ref url) = overrides.endpoint {
        info!(url = %url, "Overriding endpoint from CLI");
        config.endpoint.url = url.clone();
    }
    if let Some(ref token) = overrides.token {
        config.endpoint.auth_token = token.clone();
    }
    if let Some(batch_size) = overrides.batch_size {
        config.delivery.batch_size = batch_size;
    }
    if let Some(concurrency) = overrides.concurrency {
        config.delivery.concurrency = concurrency;
    }
    if let Some(max_retries) = overrides.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(delimiter) = overrides.delimiter {
        config.input.delimiter = delimiter;
    }
}
