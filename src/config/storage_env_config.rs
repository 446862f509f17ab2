//! Storage locations parsed from environment variables.

use std::env;
use std::path::PathBuf;

/// Storage environment configuration
#[derive(Debug, Clone)]
pub struct StorageEnvConfig {
    /// Directory holding `model_<TICKER>.json` artifacts
    pub models_dir: PathBuf,
    /// Directory holding `<TICKER>.csv` price files
    pub data_dir: PathBuf,
}

impl Default for StorageEnvConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl StorageEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            models_dir: env::var("STOCKCAST_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            data_dir: env::var("STOCKCAST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }
}
