//! Pipeline orchestrator - transform, batch, dispatch, report.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::LoaderConfig;
use dispatcher::{create_dispatcher, Batcher};
use ingestion::CsvRecordSource;
use observability::DeliveryAggregator;
use tracing::{info, instrument, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated run configuration (file + overrides)
    pub loader: LoaderConfig,

    /// Input file
    pub input: PathBuf,

    /// Stop after batching
    pub dry_run: bool,

    /// Where to write the JSON run report
    pub report_json: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    ///
    /// Delivery failures are reported in the returned stats, not as `Err`.
    #[instrument(name = "pipeline_run", skip(self), fields(input = %self.config.input.display()))]
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let loader = &self.config.loader;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        if loader.endpoint.auth_token.is_empty() && !self.config.dry_run {
            warn!("No authorization token configured; requests are sent without credentials");
        }

        // Transform
        let source = CsvRecordSource::from_config(&self.config.input, &loader.input);
        let transform_started = Instant::now();
        let output = tokio::task::spawn_blocking(move || source.produce_with_stats())
            .await
            .context("Transform task failed")?
            .map_err(CliError::from)?;
        let transform_elapsed = transform_started.elapsed();
        info!(
            records = output.records.len(),
            elapsed_secs = transform_elapsed.as_secs_f64(),
            "Transform finished"
        );

        // Batch
        let batcher = Batcher::new(loader.delivery.batch_size).map_err(CliError::from)?;
        let record_count = output.records.len();
        let batches = batcher.split(output.records);
        info!(
            records = record_count,
            batches = batches.len(),
            batch_size = batcher.batch_size(),
            "Input batched"
        );

        let mut stats = PipelineStats {
            transform: output.stats,
            transform_elapsed,
            batches: batches.len(),
            ..Default::default()
        };

        if self.config.dry_run {
            info!("Dry run mode - nothing sent");
            stats.duration = start_time.elapsed();
            return Ok(stats);
        }

        // Dispatch
        let dispatcher = create_dispatcher(loader).map_err(CliError::from)?;
        let mut aggregator = DeliveryAggregator::new();
        let report = dispatcher
            .run_observed(batches, |outcome| aggregator.update(outcome))
            .await;
        let dispatch_elapsed = report.elapsed;
        info!(
            batches = report.total_batches,
            failed = report.failed_batches.len(),
            elapsed_secs = dispatch_elapsed.as_secs_f64(),
            "Dispatch finished"
        );

        if let Some(ref path) = self.config.report_json {
            let json = report
                .to_json_pretty()
                .context("Failed to serialize run report")?;
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Run report written");
        }

        stats.dispatch_elapsed = dispatch_elapsed;
        stats.dispatch = Some(dispatcher.metrics());
        stats.delivery = Some(aggregator.summary());
        stats.report = Some(report);
        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}
