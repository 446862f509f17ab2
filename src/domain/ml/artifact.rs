use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bumped whenever the persisted layout changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What the regressor was trained to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEncoding {
    /// Absolute close `horizon` periods ahead
    #[default]
    NextClosePrice,
    /// Fractional return over the horizon
    NextReturn,
}

impl TargetEncoding {
    /// Converts a raw regressor output into a price level.
    pub fn to_price(self, raw: f64, current_price: f64) -> f64 {
        match self {
            TargetEncoding::NextClosePrice => raw,
            TargetEncoding::NextReturn => current_price * (1.0 + raw),
        }
    }
}

impl FromStr for TargetEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "next_close_price" => Ok(TargetEncoding::NextClosePrice),
            "next_return" => Ok(TargetEncoding::NextReturn),
            _ => anyhow::bail!(
                "Invalid TARGET_ENCODING: {}. Must be 'next_close_price' or 'next_return'",
                s
            ),
        }
    }
}

impl fmt::Display for TargetEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetEncoding::NextClosePrice => write!(f, "next_close_price"),
            TargetEncoding::NextReturn => write!(f, "next_return"),
        }
    }
}

/// Percentile thresholds used to label the training set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionQuantiles {
    pub lower: f64,
    pub upper: f64,
}

/// Held-out evaluation of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub baseline_mae: f64,
    /// baseline_mae / model_mae; above 1.0 the model beats persistence
    pub quality_ratio: f64,
    pub decision_accuracy: f64,
    pub decision_quantiles: DecisionQuantiles,
    pub target: TargetEncoding,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Persisted result of one training run for one ticker.
///
/// Generic over the fitted regressor `R` and classifier `C`; the pipeline
/// only reaches them through `application::ml::predictor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<R, C> {
    pub format_version: u32,
    pub ticker: String,
    pub price_model: R,
    pub decision_model: C,
    /// Frozen column order the models were fitted on
    pub feature_columns: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub metrics: TrainingMetrics,
    pub target_horizon: usize,
    pub use_baseline: bool,
    pub blend_weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_encoding_to_price() {
        assert_eq!(TargetEncoding::NextClosePrice.to_price(101.5, 100.0), 101.5);
        let price = TargetEncoding::NextReturn.to_price(0.02, 100.0);
        assert!((price - 102.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_encoding_serialized_tag() {
        let json = serde_json::to_string(&TargetEncoding::NextClosePrice).unwrap();
        assert_eq!(json, "\"next_close_price\"");
        assert_eq!(
            "next_return".parse::<TargetEncoding>().unwrap(),
            TargetEncoding::NextReturn
        );
        assert!("log_return".parse::<TargetEncoding>().is_err());
    }
}
