//! Equality filter (`key=value`)

use contracts::Record;

use crate::error::{IngestionError, Result};

/// Parsed `key=value` filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    pub key: String,
    pub value: String,
}

impl FilterExpr {
    /// Parse `key=value`; key and value are trimmed, value may contain `=`
    pub fn parse(expression: &str) -> Result<Self> {
        let (key, value) =
            expression
                .split_once('=')
                .ok_or_else(|| IngestionError::InvalidFilter {
                    expression: expression.to_string(),
                })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(IngestionError::InvalidFilter {
                expression: expression.to_string(),
            });
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }

    /// Keep the records whose `key` field renders as `value`
    pub fn apply(&self, records: Vec<Record>, columns: &[String]) -> Result<Vec<Record>> {
        if !columns.iter().any(|c| c == &self.key) {
            return Err(IngestionError::UnknownFilterKey {
                key: self.key.clone(),
                columns: columns.to_vec(),
            });
        }
        Ok(records
            .into_iter()
            .filter(|r| r.get(&self.key).is_some_and(|v| v.to_string() == self.value))
            .collect())
    }
}
