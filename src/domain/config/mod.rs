//! Configuration domain module
//!
//! Value objects for the prediction pipeline. Loading from the environment
//! lives in `crate::config`.

pub mod feature_config;
pub mod pipeline_config;

pub use feature_config::FeatureConfig;
pub use pipeline_config::{
    BlendMode, ForestParams, InferenceConfig, PipelineConfig, PipelineConfigError,
    TrainingConfig, TrustConfig,
};
