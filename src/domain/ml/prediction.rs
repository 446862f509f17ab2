use crate::domain::ml::artifact::TrainingMetrics;
use crate::domain::ml::decision::DecisionLabel;
use crate::domain::ml::quality::ConfidenceTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forecast for the most recent feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub current_price: f64,
    /// Regressor output interpreted as a price level
    pub model_price: f64,
    /// Price after the blend step
    pub final_price: f64,
    pub predicted_return: f64,
    pub decision: DecisionLabel,
    pub confidence: ConfidenceTier,
    /// Weight actually applied to `model_price` in `final_price`
    pub blend_weight: f64,
    pub used_baseline: bool,
}

/// Record returned to the caller of `PredictionService::run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub ticker: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub model_price: f64,
    pub predicted_return: f64,
    pub decision: DecisionLabel,
    pub used_baseline: bool,
    pub blend_weight: f64,
    pub confidence: ConfidenceTier,
    pub recent_volatility: f64,
    pub model_trained: bool,
    pub trained_at: DateTime<Utc>,
    pub target_horizon: usize,
    pub metrics: TrainingMetrics,
    pub recent_close_prices: Vec<f64>,
    pub data_source: String,
    pub data_period: String,
    pub data_rows: usize,
    pub data_start: String,
    pub data_end: String,
    pub model_key: String,
}

/// Outcome of an explicit training run, without inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub ticker: String,
    pub model_key: String,
    pub trained_at: DateTime<Utc>,
    pub target_horizon: usize,
    pub feature_columns: Vec<String>,
    pub use_baseline: bool,
    pub blend_weight: f64,
    pub metrics: TrainingMetrics,
    pub data_rows: usize,
}
