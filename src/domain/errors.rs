use thiserror::Error;

/// Errors raised by the prediction pipeline.
///
/// Every variant is terminal for the current call. `ArtifactFormat` and
/// `NotTrained` are the only ones the orchestrator recovers from, by training
/// once and retrying inference.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid price data: {reason}")]
    Data { reason: String },

    #[error("Not enough data for training: {rows} usable rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Model artifact format is invalid for {key}: {reason}")]
    ArtifactFormat { key: String, reason: String },

    #[error("Model not trained for {ticker}: no artifact found")]
    NotTrained { ticker: String },

    #[error("Missing required feature columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("Model backend failed during {stage}: {reason}")]
    Model { stage: &'static str, reason: String },

    #[error("Artifact store failure for {key}: {reason}")]
    Store { key: String, reason: String },
}

impl PredictionError {
    pub fn data(reason: impl Into<String>) -> Self {
        Self::Data {
            reason: reason.into(),
        }
    }

    pub fn model(stage: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Model {
            stage,
            reason: reason.to_string(),
        }
    }

    /// True when retraining can repair the failure (absent or unreadable artifact).
    pub fn is_artifact_recoverable(&self) -> bool {
        matches!(self, Self::ArtifactFormat { .. } | Self::NotTrained { .. })
    }
}
