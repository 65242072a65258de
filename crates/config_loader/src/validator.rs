//! Configuration validation
//!
//! Rules:
//! - field-level constraints declared on the contract types (url, ranges)
//! - base_delay_ms <= max_delay_ms
//! - delimiter is a single printable ASCII char other than `"`
//! - filter, when present, has the form `key=value` with a non-empty key

use contracts::{ContractError, InputConfig, LoaderConfig, RetryConfig};
use validator::Validate;

/// Validate a LoaderConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &LoaderConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("config", e.to_string()))?;
    validate_retry_bounds(&config.retry)?;
    validate_delimiter(&config.input)?;
    validate_filter(&config.input)?;
    Ok(())
}

fn validate_retry_bounds(retry: &RetryConfig) -> Result<(), ContractError> {
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ContractError::config_validation(
            "retry.base_delay_ms / retry.max_delay_ms",
            format!(
                "base_delay_ms ({}) must be <= max_delay_ms ({})",
                retry.base_delay_ms, retry.max_delay_ms
            ),
        ));
    }
    Ok(())
}

fn validate_delimiter(input: &InputConfig) -> Result<(), ContractError> {
    let d = input.delimiter;
    if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
        return Err(ContractError::config_validation(
            "input.delimiter",
            format!("unsupported delimiter {d:?}"),
        ));
    }
    Ok(())
}

fn validate_filter(input: &InputConfig) -> Result<(), ContractError> {
    let Some(filter) = input.filter.as_deref() else {
        return Ok(());
    };
    match filter.split_once('=') {
        Some((key, _)) if !key.trim().is_empty() => Ok(()),
        Some(_) => Err(ContractError::config_validation(
            "input.filter",
            format!("filter key cannot be empty: '{filter}'"),
        )),
        None => Err(ContractError::config_validation(
            "input.filter",
            format!("filter must be in the form key=value, got '{filter}'"),
        )),
    }
}
