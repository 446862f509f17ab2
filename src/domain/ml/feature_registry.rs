use crate::domain::errors::PredictionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical feature columns produced with the default `FeatureConfig`.
/// A trained artifact freezes its own copy of the list; changing this order
/// only affects artifacts trained afterwards.
pub const DEFAULT_FEATURE_COLUMNS: &[&str] = &[
    "MA10",
    "MA20",
    "MA50",
    "EMA12",
    "EMA26",
    "MACD",
    "RSI14",
    "Return1",
    "Return5",
    "Volatility",
    "VolumeChange",
];

/// Fully defined feature values for one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    /// Values in the order of the owning table's columns
    pub values: Vec<f64>,
}

impl FeatureRow {
    /// Picks the values at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.values[i]).collect()
    }
}

/// Ordered feature rows sharing one column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<FeatureRow>) -> Self {
        debug_assert!(rows.iter().all(|r| r.values.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Maps `names` to column positions, failing with every missing name.
    pub fn resolve_columns(&self, names: &[String]) -> Result<Vec<usize>, PredictionError> {
        let mut indices = Vec::with_capacity(names.len());
        let mut missing = Vec::new();

        for name in names {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.clone()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(PredictionError::SchemaMismatch { missing })
        }
    }

    /// Row-major matrix of the selected columns.
    pub fn matrix(&self, indices: &[usize]) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.project(indices)).collect()
    }
}
