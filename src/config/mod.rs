//! Configuration module for Stockcast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Pipeline and Storage.

mod pipeline_env_config;
mod storage_env_config;

pub use pipeline_env_config::PipelineEnvConfig;
pub use storage_env_config::StorageEnvConfig;

use crate::domain::config::PipelineConfig;
use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub storage: StorageEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let pipeline = PipelineEnvConfig::from_env()
            .context("Failed to load pipeline config")?
            .pipeline;
        let storage = StorageEnvConfig::from_env();

        Ok(Self { pipeline, storage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = Config::from_env().expect("Should parse with defaults");
        assert_eq!(config.pipeline.training.target_horizon, 1);
        assert_eq!(config.pipeline.training.train_split_ratio, 0.8);
    }
}
