//! Baseline-relative trust signals.
//!
//! Price series sit close to a random walk, so a persistence forecast
//! ("tomorrow closes where today closed") is a strong competitor. Model error is
//! therefore judged relative to that baseline:
//! - `quality_ratio > 1.0`: model beats persistence
//! - `quality_ratio < 1.0`: model loses to persistence

use crate::domain::config::{InferenceConfig, TrustConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Floor applied to the model MAE before dividing.
pub const MODEL_MAE_EPSILON: f64 = 1e-12;

pub fn quality_ratio(baseline_mae: f64, model_mae: f64) -> f64 {
    baseline_mae / model_mae.max(MODEL_MAE_EPSILON)
}

/// Outcome of the training-time trust gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub use_baseline: bool,
    pub blend_weight: f64,
}

impl TrustAssessment {
    pub fn from_quality_ratio(ratio: f64, config: &TrustConfig) -> Self {
        if ratio.is_nan() || ratio < config.baseline_hard_cutoff {
            Self {
                use_baseline: true,
                blend_weight: 0.0,
            }
        } else if ratio < 1.0 {
            Self {
                use_baseline: false,
                blend_weight: config.blend_weight_when_weaker,
            }
        } else {
            Self {
                use_baseline: false,
                blend_weight: config.blend_weight_when_stronger,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// Monotonic step function of the recorded quality ratio.
    pub fn from_quality_ratio(ratio: f64, config: &InferenceConfig) -> Self {
        if ratio >= config.high_confidence_ratio {
            ConfidenceTier::High
        } else if ratio >= config.medium_confidence_ratio {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::Low => write!(f, "low"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::High => write!(f, "high"),
        }
    }
}
