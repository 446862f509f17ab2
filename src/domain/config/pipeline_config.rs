//! Pipeline Configuration Value Objects
//!
//! Every tunable constant of the prediction pipeline lives here. A
//! `PipelineConfig` is built once (defaults or `config::PipelineEnvConfig`) and
//! passed by reference into each stage.
//!
//! # Invariants
//!
//! - `train_split_ratio` is strictly between 0.0 and 1.0
//! - blend weights are in [0.0, 1.0] and the hard cutoff is non-negative
//! - `high_confidence_ratio >= medium_confidence_ratio`
//! - every window and the target horizon are positive

use crate::domain::config::feature_config::FeatureConfig;
use crate::domain::ml::artifact::TargetEncoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PipelineConfigError {
    #[error("Invalid ratio: {field} = {value}. {expected}")]
    InvalidRatio {
        field: String,
        value: f64,
        expected: &'static str,
    },

    #[error("Invalid value: {field} = {value}. Must be positive")]
    InvalidCount { field: String, value: usize },

    #[error("Inconsistent thresholds: {reason}")]
    InconsistentThresholds { reason: String },
}

/// Random forest hyperparameters shared by regressor and classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: u16,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: None,
            min_samples_split: 2,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub train_split_ratio: f64,
    pub min_training_rows: usize,
    /// Periods ahead of the regression target
    pub target_horizon: usize,
    pub target_encoding: TargetEncoding,
    pub forest: ForestParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            train_split_ratio: 0.8,
            min_training_rows: 120,
            target_horizon: 1,
            target_encoding: TargetEncoding::NextClosePrice,
            forest: ForestParams::default(),
        }
    }
}

/// Thresholds of the baseline-relative trust gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Below this quality ratio the model is not trusted at all
    pub baseline_hard_cutoff: f64,
    pub blend_weight_when_weaker: f64,
    pub blend_weight_when_stronger: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            baseline_hard_cutoff: 0.6,
            blend_weight_when_weaker: 0.35,
            blend_weight_when_stronger: 0.8,
        }
    }
}

/// How the artifact's blend weight is used at inference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Report the weight only; the final price is the model price.
    #[default]
    Advisory,
    /// Blend the model price with the persistence baseline.
    Apply,
}

impl FromStr for BlendMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "advisory" => Ok(BlendMode::Advisory),
            "apply" => Ok(BlendMode::Apply),
            _ => anyhow::bail!("Invalid BLEND_MODE: {}. Must be 'advisory' or 'apply'", s),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendMode::Advisory => write!(f, "advisory"),
            BlendMode::Apply => write!(f, "apply"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub blend_mode: BlendMode,
    pub high_confidence_ratio: f64,
    pub medium_confidence_ratio: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            blend_mode: BlendMode::Advisory,
            high_confidence_ratio: 1.0,
            medium_confidence_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub trust: TrustConfig,
    pub inference: InferenceConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineConfigError> {
        let training = &self.training;
        if !(training.train_split_ratio > 0.0 && training.train_split_ratio < 1.0) {
            return Err(PipelineConfigError::InvalidRatio {
                field: "train_split_ratio".to_string(),
                value: training.train_split_ratio,
                expected: "Must be strictly between 0.0 and 1.0",
            });
        }
        Self::validate_count("target_horizon", training.target_horizon)?;
        Self::validate_count("min_training_rows", training.min_training_rows)?;
        Self::validate_count("n_estimators", usize::from(training.forest.n_estimators))?;

        let features = &self.features;
        if features.ma_windows.is_empty() {
            return Err(PipelineConfigError::InvalidCount {
                field: "ma_windows".to_string(),
                value: 0,
            });
        }
        for window in &features.ma_windows {
            Self::validate_count("ma_windows", *window)?;
        }
        Self::validate_count("ema_fast_span", features.ema_fast_span)?;
        Self::validate_count("ema_slow_span", features.ema_slow_span)?;
        Self::validate_count("rsi_period", features.rsi_period)?;
        Self::validate_count("short_return_period", features.short_return_period)?;
        Self::validate_count("long_return_period", features.long_return_period)?;
        // Sample std-dev needs at least two points
        if features.volatility_window < 2 {
            return Err(PipelineConfigError::InvalidCount {
                field: "volatility_window".to_string(),
                value: features.volatility_window,
            });
        }
        let names = features.column_names();
        if let Some(duplicate) = names
            .iter()
            .enumerate()
            .find(|(i, name)| names[..*i].contains(name))
            .map(|(_, name)| name)
        {
            return Err(PipelineConfigError::InconsistentThresholds {
                reason: format!("feature column {} is produced twice", duplicate),
            });
        }

        Self::validate_unit("blend_weight_when_weaker", self.trust.blend_weight_when_weaker)?;
        Self::validate_unit(
            "blend_weight_when_stronger",
            self.trust.blend_weight_when_stronger,
        )?;
        let cutoff = self.trust.baseline_hard_cutoff;
        if cutoff.is_nan() || cutoff < 0.0 {
            return Err(PipelineConfigError::InvalidRatio {
                field: "baseline_hard_cutoff".to_string(),
                value: cutoff,
                expected: "Must be non-negative",
            });
        }

        let inference = &self.inference;
        if inference.high_confidence_ratio < inference.medium_confidence_ratio {
            return Err(PipelineConfigError::InconsistentThresholds {
                reason: format!(
                    "high_confidence_ratio {} < medium_confidence_ratio {}",
                    inference.high_confidence_ratio, inference.medium_confidence_ratio
                ),
            });
        }

        Ok(())
    }

    fn validate_count(field: &str, value: usize) -> Result<(), PipelineConfigError> {
        if value == 0 {
            return Err(PipelineConfigError::InvalidCount {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_unit(field: &str, value: f64) -> Result<(), PipelineConfigError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(PipelineConfigError::InvalidRatio {
                field: field.to_string(),
                value,
                expected: "Must be between 0.0 and 1.0",
            });
        }
        Ok(())
    }
}
