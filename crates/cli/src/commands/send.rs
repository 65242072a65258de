//! `send` command implementation.

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::SendArgs;
use crate::commands::resolve_config;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `send` command
///
/// Fails when the configuration or input is invalid, when interrupted, and
/// when any batch is not delivered.
pub async fn run_send(args: &SendArgs) -> Result<()> {
    let mut loader = resolve_config(args.config.as_deref(), &args.overrides)?;
    if let Some(ref filter) = args.filter {
        loader.input.filter = Some(filter.clone());
        config_loader::ConfigLoader::validate(&loader).map_err(CliError::from)?;
    }

    info!(
        input = %args.file.display(),
        endpoint = %loader.endpoint.url,
        batch_size = loader.delivery.batch_size,
        concurrency = loader.delivery.concurrency,
        max_retries = loader.retry.max_retries,
        filter = ?loader.input.filter,
        "Configuration loaded"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        loader,
        input: args.file.clone(),
        dry_run: args.dry_run,
        report_json: args.report_json.clone(),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    let shutdown_signal = setup_shutdown_signal();

    // Losing the race drops the pipeline future, aborting in-flight deliveries
    let stats = tokio::select! {
        result = pipeline.run() => result?,
        _ = shutdown_signal => {
            warn!("Received shutdown signal, cancelling in-flight batches...");
            return Err(CliError::Interrupted.into());
        }
    };

    stats.print_summary();

    match stats.report {
        Some(ref report) if !report.is_success() => Err(CliError::DeliveryFailed {
            failed: report.failed_batches.len(),
            total: report.total_batches,
            records: report.failed_records(),
        }
        .into()),
        _ => {
            info!("Activity Loader finished");
            Ok(())
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
