//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::LoaderConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    endpoint: String,
    batch_size: usize,
    concurrency: usize,
    max_retries: u32,
    max_attempts: u32,
    delimiter: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    endpoint: config.endpoint.url.clone(),
                    batch_size: config.delivery.batch_size,
                    concurrency: config.delivery.concurrency,
                    max_retries: config.retry.max_retries,
                    max_attempts: config.retry.max_retries.saturating_add(1),
                    delimiter: config.input.delimiter,
                    filter: config.input.filter.clone(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &LoaderConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.endpoint.auth_token.is_empty() {
        warnings.push("endpoint.auth_token is empty - requests carry no credentials".to_string());
    } else if config.endpoint.url.starts_with("http://") {
        warnings.push("endpoint.url is plain http - the token is sent unencrypted".to_string());
    }

    if config.delivery.concurrency > config.http.max_connections {
        warnings.push(format!(
            "delivery.concurrency ({}) exceeds http.max_connections ({}) - extra batches wait for a connection",
            config.delivery.concurrency, config.http.max_connections
        ));
    }

    if config.retry.max_retries == 0 {
        warnings.push("retry.max_retries is 0 - transient failures are not retried".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Endpoint: {}", summary.endpoint);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Concurrency: {}", summary.concurrency);
            println!(
                "  Retries: {} ({} attempts per batch)",
                summary.max_retries, summary.max_attempts
            );
            println!("  Delimiter: {:?}", summary.delimiter);
            if let Some(ref filter) = summary.filter {
                println!("  Filter: {}", filter);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
