//! Pipeline configuration parsing from environment variables.
//!
//! This module handles loading the training split, forest hyperparameters,
//! trust gate thresholds and inference settings.

use crate::domain::config::{
    BlendMode, FeatureConfig, ForestParams, InferenceConfig, PipelineConfig, TrainingConfig,
    TrustConfig,
};
use crate::domain::ml::TargetEncoding;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Pipeline environment configuration
#[derive(Debug, Clone)]
pub struct PipelineEnvConfig {
    pub pipeline: PipelineConfig,
}

impl PipelineEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = PipelineConfig::default();

        let target_encoding = match env::var("TARGET_ENCODING") {
            Ok(raw) => TargetEncoding::from_str(&raw)?,
            Err(_) => defaults.training.target_encoding,
        };
        let blend_mode = match env::var("BLEND_MODE") {
            Ok(raw) => BlendMode::from_str(&raw)?,
            Err(_) => defaults.inference.blend_mode,
        };
        let max_depth = match env::var("MAX_DEPTH") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u16>()
                    .context("Failed to parse MAX_DEPTH")?,
            ),
            _ => None,
        };

        let pipeline = PipelineConfig {
            features: FeatureConfig::default(),
            training: TrainingConfig {
                train_split_ratio: Self::parse_f64(
                    "TRAIN_SPLIT_RATIO",
                    defaults.training.train_split_ratio,
                )?,
                min_training_rows: Self::parse_usize(
                    "MIN_ROWS_FOR_TRAINING",
                    defaults.training.min_training_rows,
                )?,
                target_horizon: Self::parse_usize(
                    "TARGET_HORIZON",
                    defaults.training.target_horizon,
                )?,
                target_encoding,
                forest: ForestParams {
                    n_estimators: Self::parse_u16(
                        "N_ESTIMATORS",
                        defaults.training.forest.n_estimators,
                    )?,
                    max_depth,
                    min_samples_split: Self::parse_usize(
                        "MIN_SAMPLES_SPLIT",
                        defaults.training.forest.min_samples_split,
                    )?,
                    random_state: Self::parse_u64(
                        "RANDOM_STATE",
                        defaults.training.forest.random_state,
                    )?,
                },
            },
            trust: TrustConfig {
                baseline_hard_cutoff: Self::parse_f64(
                    "BASELINE_HARD_CUTOFF",
                    defaults.trust.baseline_hard_cutoff,
                )?,
                blend_weight_when_weaker: Self::parse_f64(
                    "BLEND_WEIGHT_WHEN_WEAKER",
                    defaults.trust.blend_weight_when_weaker,
                )?,
                blend_weight_when_stronger: Self::parse_f64(
                    "BLEND_WEIGHT_WHEN_STRONGER",
                    defaults.trust.blend_weight_when_stronger,
                )?,
            },
            inference: InferenceConfig {
                blend_mode,
                high_confidence_ratio: Self::parse_f64(
                    "CONFIDENCE_HIGH_RATIO",
                    defaults.inference.high_confidence_ratio,
                )?,
                medium_confidence_ratio: Self::parse_f64(
                    "CONFIDENCE_MEDIUM_RATIO",
                    defaults.inference.medium_confidence_ratio,
                )?,
            },
        };

        pipeline
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid pipeline config: {}", e))?;

        Ok(Self { pipeline })
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u16(key: &str, default: u16) -> Result<u16> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u16>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
