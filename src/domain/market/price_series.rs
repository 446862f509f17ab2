use crate::domain::errors::PredictionError;
use crate::domain::market::period::HistoryPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One period of price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(timestamp: DateTime<Utc>, close: f64, volume: Option<f64>) -> Self {
        Self {
            timestamp,
            close,
            volume,
        }
    }
}

/// Chronologically ordered price/volume history for one instrument.
///
/// The pipeline only reads from a series; derived columns live in a separate
/// `FeatureTable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volume is only usable when every bar carries it.
    pub fn has_volume(&self) -> bool {
        !self.bars.is_empty() && self.bars.iter().all(|b| b.volume.is_some())
    }

    /// Checks the ordering and value invariants the feature pipeline relies on.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.bars.is_empty() {
            return Err(PredictionError::data("price series is empty"));
        }

        for (i, bar) in self.bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(PredictionError::data(format!(
                    "invalid Close value {} at {}",
                    bar.close, bar.timestamp
                )));
            }
            if let Some(volume) = bar.volume
                && (!volume.is_finite() || volume < 0.0)
            {
                return Err(PredictionError::data(format!(
                    "invalid Volume value {} at {}",
                    volume, bar.timestamp
                )));
            }
            if i > 0 && bar.timestamp <= self.bars[i - 1].timestamp {
                return Err(PredictionError::data(format!(
                    "timestamps must be strictly increasing ({} follows {})",
                    bar.timestamp,
                    self.bars[i - 1].timestamp
                )));
            }
        }

        Ok(())
    }

    /// Returns the bars covered by `period`, counted back from the last bar.
    pub fn trailing(&self, period: HistoryPeriod) -> PriceSeries {
        let Some(last) = self.bars.last() else {
            return PriceSeries::default();
        };

        match period.window_start(last.timestamp) {
            Some(start) => PriceSeries::new(
                self.bars
                    .iter()
                    .filter(|b| b.timestamp > start)
                    .cloned()
                    .collect(),
            ),
            None => self.clone(),
        }
    }
}

/// Uppercases and trims a ticker symbol. Empty symbols are rejected.
pub fn normalize_ticker(ticker: &str) -> Result<String, PredictionError> {
    let normalized = ticker.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(PredictionError::data("ticker symbol is empty"));
    }
    Ok(normalized)
}

/// Storage key for a normalized ticker (path separators are not allowed in keys).
pub fn artifact_key(ticker: &str) -> String {
    ticker.replace(['/', '\\'], "_")
}
