//! CSV-backed record source

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use contracts::{InputConfig, Record, RecordSource};
use tracing::{info, instrument};

use crate::error::{IngestionError, Result};
use crate::filter::FilterExpr;
use crate::transform::{transform, Table, TransformOutput};

/// Reads a delimited file and yields the cleaned records
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
    delimiter: u8,
    filter: Option<String>,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b';',
            filter: None,
        }
    }

    /// Create from the `[input]` configuration section
    pub fn from_config(path: impl Into<PathBuf>, config: &InputConfig) -> Self {
        Self::new(path)
            .with_delimiter(config.delimiter as u8)
            .with_filter(config.filter.clone())
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the full transform, keeping the statistics
    #[instrument(name = "csv_source_produce", skip(self), fields(path = %self.path.display()))]
    pub fn produce_with_stats(&self) -> Result<TransformOutput> {
        let started = Instant::now();

        // filter is parsed before the file is opened
        let filter = self.filter.as_deref().map(FilterExpr::parse).transpose()?;

        let file = File::open(&self.path).map_err(|source| IngestionError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let table = Table::read(file, self.delimiter)?;
        let output = transform(table, filter.as_ref())?;

        info!(
            records = output.records.len(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Input preprocessed"
        );
        Ok(output)
    }
}

impl RecordSource for CsvRecordSource {
    type Error = IngestionError;

    fn produce(&self) -> Result<Vec<Record>> {
        self.produce_with_stats().map(|output| output.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_produce_from_file() {
        let file = write_csv(
            "id,asset,ip,category\n1,a,10.0.0.1,phishing\n2,b,10.0.0.2,Supply Chain Compromise\n",
        );
        let source = CsvRecordSource::new(file.path()).with_delimiter(b',');
        let records = source.produce().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].get("category").and_then(|v| v.as_text()),
            Some("supplychaincompromise")
        );
    }

    #[test]
    fn test_malformed_filter_fails_before_reading() {
        let source = CsvRecordSource::new("/definitely/missing.csv")
            .with_filter(Some("category".into()));
        assert!(matches!(
            source.produce(),
            Err(IngestionError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let source = CsvRecordSource::new("/definitely/missing.csv");
        assert!(matches!(source.produce(), Err(IngestionError::Io { .. })));
    }

    #[test]
    fn test_from_config() {
        let file = write_csv("id;ip;category\n1;10.0.0.1;phishing\n2;10.0.0.2;validaccounts\n");
        let config = InputConfig {
            delimiter: ';',
            filter: Some("category=validaccounts".into()),
        };
        let output = CsvRecordSource::from_config(file.path(), &config)
            .produce_with_stats()
            .unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.stats.filtered_out, 1);
    }
}
