//! Record transform: clean, normalize and filter raw rows

use std::io::Read;
use std::net::IpAddr;

use contracts::{FieldValue, Record, Schema};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::category;
use crate::error::{IngestionError, Result};
use crate::filter::FilterExpr;

/// Columns removed before delivery
const DROPPED_COLUMNS: [&str; 2] = ["created_utc", "source"];

/// Rows shown in the preview log
const PREVIEW_ROWS: usize = 10;

/// Raw table as read from the input
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    /// `(line, values)`; `line` is the 1-based data row number
    pub rows: Vec<(usize, Vec<FieldValue>)>,
}

impl Table {
    /// Read a delimited table with a header row
    ///
    /// Short rows are padded with `Null`, extra cells are ignored.
    pub fn read<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let raw = result?;
            let values = (0..columns.len())
                .map(|c| raw.get(c).map_or(FieldValue::Null, FieldValue::infer))
                .collect();
            rows.push((i + 1, values));
        }

        Ok(Self { columns, rows })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| IngestionError::missing_column(name))
    }
}

/// Counters for one transform run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub rows_read: usize,
    pub invalid_ip: usize,
    pub incomplete: usize,
    pub filtered_out: usize,
    pub emitted: usize,
}

/// Transform result
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub records: Vec<Record>,
    pub stats: TransformStats,
}

/// True if `value` is text holding a valid IPv4/IPv6 address
pub fn is_valid_ip(value: &FieldValue) -> bool {
    value
        .as_text()
        .is_some_and(|s| s.trim().parse::<IpAddr>().is_ok())
}

/// Clean a raw table into the ordered record sequence
pub fn transform(mut table: Table, filter: Option<&FilterExpr>) -> Result<TransformOutput> {
    let mut stats = TransformStats {
        rows_read: table.rows.len(),
        ..Default::default()
    };

    let category_idx = table.require("category")?;
    normalize_categories(&mut table, category_idx);

    let ip_idx = table.require("ip")?;

    if table.position("asset").is_none() {
        if let Some(idx) = table.position("asset_name") {
            table.columns[idx] = "asset".to_string();
        }
    }

    stats.invalid_ip = drop_invalid_ip(&mut table, ip_idx);
    drop_columns(&mut table, &DROPPED_COLUMNS);
    stats.incomplete = drop_incomplete(&mut table);

    let schema = Schema::new(table.columns.iter().cloned());
    let mut records: Vec<Record> = table
        .rows
        .into_iter()
        .map(|(_, values)| Record::new(schema.clone(), values))
        .collect();

    if let Some(filter) = filter {
        let before = records.len();
        records = filter.apply(records, schema.columns())?;
        stats.filtered_out = before - records.len();
        debug!(
            key = %filter.key,
            value = %filter.value,
            removed = stats.filtered_out,
            "Filter applied"
        );
    }

    stats.emitted = records.len();
    log_preview(&records);

    info!(
        rows_read = stats.rows_read,
        invalid_ip = stats.invalid_ip,
        incomplete = stats.incomplete,
        filtered_out = stats.filtered_out,
        emitted = stats.emitted,
        "Records cleaned"
    );

    Ok(TransformOutput { records, stats })
}

fn normalize_categories(table: &mut Table, idx: usize) {
    for (_, values) in &mut table.rows {
        let normalized = match &values[idx] {
            FieldValue::Text(raw) => category::normalize(raw).map(FieldValue::Text),
            _ => None,
        };
        values[idx] = normalized.unwrap_or(FieldValue::Null);
    }
}

fn drop_invalid_ip(table: &mut Table, ip_idx: usize) -> usize {
    let before = table.rows.len();
    table.rows.retain(|(line, values)| {
        let valid = is_valid_ip(&values[ip_idx]);
        if !valid {
            warn!(row = line, ip = %values[ip_idx], "Dropping row with invalid IP");
        }
        valid
    });
    let dropped = before - table.rows.len();
    counter!("activity_loader_rows_dropped_total", "reason" => "invalid_ip")
        .increment(dropped as u64);
    dropped
}

fn drop_columns(table: &mut Table, names: &[&str]) {
    let keep: Vec<usize> = (0..table.columns.len())
        .filter(|&i| !names.contains(&table.columns[i].as_str()))
        .collect();
    if keep.len() == table.columns.len() {
        return;
    }

    table.columns = keep.iter().map(|&i| table.columns[i].clone()).collect();
    for (_, values) in &mut table.rows {
        let mut old = std::mem::take(values);
        *values = keep
            .iter()
            .map(|&i| std::mem::replace(&mut old[i], FieldValue::Null))
            .collect();
    }
}

fn drop_incomplete(table: &mut Table) -> usize {
    let before = table.rows.len();
    let columns = &table.columns;
    table.rows.retain(|(line, values)| {
        let missing: Vec<&str> = columns
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_null())
            .map(|(c, _)| c.as_str())
            .collect();
        if !missing.is_empty() {
            warn!(row = line, missing = ?missing, "Dropping row with null/empty values");
        }
        missing.is_empty()
    });
    let dropped = before - table.rows.len();
    counter!("activity_loader_rows_dropped_total", "reason" => "incomplete")
        .increment(dropped as u64);
    dropped
}

fn log_preview(records: &[Record]) {
    for (i, record) in records.iter().take(PREVIEW_ROWS).enumerate() {
        let rendered = record
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(index = i, record = %rendered, "Preview");
    }
}
