//! JSON encoding of model artifacts.
//!
//! The store only sees opaque bytes. Anything that cannot be decoded into an
//! artifact of the current format version is an `ArtifactFormat` error, which
//! the orchestrator repairs by retraining.

use super::smartcore_predictor::{ForestClassifier, ForestRegressor};
use crate::domain::errors::PredictionError;
use crate::domain::ml::{ARTIFACT_FORMAT_VERSION, ModelArtifact};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Artifact produced by the default random forest backend.
pub type ForestArtifact = ModelArtifact<ForestRegressor, ForestClassifier>;

pub fn encode_artifact<R, C>(artifact: &ModelArtifact<R, C>) -> Result<Vec<u8>, PredictionError>
where
    R: Serialize,
    C: Serialize,
{
    serde_json::to_vec(artifact).map_err(|e| PredictionError::Store {
        key: artifact.ticker.clone(),
        reason: format!("Failed to serialize artifact: {}", e),
    })
}

pub fn decode_artifact<R, C>(key: &str, blob: &[u8]) -> Result<ModelArtifact<R, C>, PredictionError>
where
    R: DeserializeOwned,
    C: DeserializeOwned,
{
    let format_error = |reason: String| PredictionError::ArtifactFormat {
        key: key.to_string(),
        reason,
    };

    if blob.is_empty() {
        return Err(format_error("empty blob".to_string()));
    }

    let artifact: ModelArtifact<R, C> = serde_json::from_slice(blob)
        .map_err(|e| format_error(format!("failed to decode: {}", e)))?;

    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(format_error(format!(
            "format version {} is not supported (expected {})",
            artifact.format_version, ARTIFACT_FORMAT_VERSION
        )));
    }
    if artifact.feature_columns.is_empty() {
        return Err(format_error("artifact has no feature columns".to_string()));
    }

    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{DecisionQuantiles, TargetEncoding, TrainingMetrics};
    use chrono::{TimeZone, Utc};

    type PlainArtifact = ModelArtifact<Vec<f64>, String>;

    fn artifact() -> PlainArtifact {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            ticker: "MSFT".to_string(),
            price_model: vec![1.0, 2.0],
            decision_model: "hold".to_string(),
            feature_columns: vec!["MA10".to_string(), "RSI14".to_string()],
            trained_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            metrics: TrainingMetrics {
                mae: 1.5,
                rmse: 2.0,
                r2: 0.1,
                baseline_mae: 1.2,
                quality_ratio: 0.8,
                decision_accuracy: 0.4,
                decision_quantiles: DecisionQuantiles {
                    lower: -0.004,
                    upper: 0.005,
                },
                target: TargetEncoding::NextClosePrice,
                train_rows: 160,
                test_rows: 40,
            },
            target_horizon: 1,
            use_baseline: false,
            blend_weight: 0.35,
        }
    }

    #[test]
    fn test_roundtrip_keeps_metadata() {
        let blob = encode_artifact(&artifact()).unwrap();
        let decoded: PlainArtifact = decode_artifact("MSFT", &blob).unwrap();

        assert_eq!(decoded.feature_columns, artifact().feature_columns);
        assert_eq!(decoded.metrics, artifact().metrics);
        assert_eq!(decoded.trained_at, artifact().trained_at);
        assert_eq!(decoded.price_model, vec![1.0, 2.0]);
    }

    #[test]
    fn test_target_tag_is_literal() {
        let blob = encode_artifact(&artifact()).unwrap();
        let text = String::from_utf8(blob).unwrap();
        assert!(text.contains("\"target\":\"next_close_price\""));
    }

    #[test]
    fn test_garbage_is_format_error() {
        for blob in [&b""[..], &b"not json"[..], &b"{\"ticker\":\"MSFT\"}"[..]] {
            let err = decode_artifact::<Vec<f64>, String>("MSFT", blob).unwrap_err();
            assert!(
                matches!(err, PredictionError::ArtifactFormat { .. }),
                "unexpected error: {err}"
            );
            assert!(err.is_artifact_recoverable());
        }
    }

    #[test]
    fn test_version_mismatch_is_format_error() {
        let mut old = artifact();
        old.format_version = ARTIFACT_FORMAT_VERSION + 1;
        let blob = encode_artifact(&old).unwrap();

        let err = decode_artifact::<Vec<f64>, String>("MSFT", &blob).unwrap_err();
        assert!(matches!(err, PredictionError::ArtifactFormat { .. }));
    }

    #[test]
    fn test_empty_columns_is_format_error() {
        let mut broken = artifact();
        broken.feature_columns.clear();
        let blob = encode_artifact(&broken).unwrap();

        let err = decode_artifact::<Vec<f64>, String>("MSFT", &blob).unwrap_err();
        assert!(matches!(err, PredictionError::ArtifactFormat { .. }));
    }
}
