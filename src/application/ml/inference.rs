use super::predictor::{Classifier, Regressor};
use crate::domain::config::{BlendMode, InferenceConfig};
use crate::domain::errors::PredictionError;
use crate::domain::ml::{ConfidenceTier, FeatureTable, ModelArtifact, PredictionResult};
use tracing::debug;

/// Predicts from the most recent feature row only.
///
/// Earlier rows exist solely to warm up the windowed features. The frozen
/// column list of the artifact must be present in `table`; otherwise this
/// fails with `SchemaMismatch` rather than guessing.
pub fn predict_latest<R, C>(
    artifact: &ModelArtifact<R, C>,
    table: &FeatureTable,
    config: &InferenceConfig,
) -> Result<PredictionResult, PredictionError>
where
    R: Regressor,
    C: Classifier,
{
    let indices = table.resolve_columns(&artifact.feature_columns)?;
    let latest = table
        .latest()
        .ok_or_else(|| PredictionError::data("No feature rows available for inference"))?;
    let row = vec![latest.project(&indices)];
    let current_price = latest.close;

    let raw = artifact
        .price_model
        .predict(&row)?
        .first()
        .copied()
        .ok_or_else(|| PredictionError::model("regressor predict", "empty prediction"))?;
    let model_price = artifact.metrics.target.to_price(raw, current_price);

    let decision = artifact
        .decision_model
        .predict(&row)?
        .first()
        .copied()
        .ok_or_else(|| PredictionError::model("classifier predict", "empty prediction"))?;

    let (final_price, blend_weight, used_baseline) = match config.blend_mode {
        BlendMode::Advisory => (model_price, 1.0, false),
        BlendMode::Apply => {
            let weight = artifact.blend_weight;
            (
                weight * model_price + (1.0 - weight) * current_price,
                weight,
                artifact.use_baseline,
            )
        }
    };

    let confidence = ConfidenceTier::from_quality_ratio(artifact.metrics.quality_ratio, config);

    debug!(
        "Inference for {}: close={:.4}, model={:.4}, final={:.4}, decision={}, confidence={}",
        artifact.ticker, current_price, model_price, final_price, decision, confidence
    );

    Ok(PredictionResult {
        current_price,
        model_price,
        final_price,
        predicted_return: model_price / current_price - 1.0,
        decision,
        confidence,
        blend_weight,
        used_baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::ForestParams;
    use crate::domain::ml::{
        ARTIFACT_FORMAT_VERSION, DecisionLabel, DecisionQuantiles, FeatureRow, TargetEncoding,
        TrainingMetrics,
    };
    use chrono::{TimeZone, Utc};

    /// Returns the first feature value as its prediction.
    #[derive(Debug)]
    struct EchoRegressor;

    impl Regressor for EchoRegressor {
        fn fit(_: &[Vec<f64>], _: &[f64], _: &ForestParams) -> Result<Self, PredictionError> {
            Ok(Self)
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError> {
            Ok(features.iter().map(|row| row[0]).collect())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[derive(Debug)]
    struct FixedClassifier(DecisionLabel);

    impl Classifier for FixedClassifier {
        fn fit(
            _: &[Vec<f64>],
            labels: &[DecisionLabel],
            _: &ForestParams,
        ) -> Result<Self, PredictionError> {
            Ok(Self(labels[0]))
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<DecisionLabel>, PredictionError> {
            Ok(vec![self.0; features.len()])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn artifact(
        target: TargetEncoding,
        quality_ratio: f64,
        use_baseline: bool,
        blend_weight: f64,
    ) -> ModelArtifact<EchoRegressor, FixedClassifier> {
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            ticker: "TEST".to_string(),
            price_model: EchoRegressor,
            decision_model: FixedClassifier(DecisionLabel::Buy),
            feature_columns: vec!["Signal".to_string()],
            trained_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            metrics: TrainingMetrics {
                mae: 1.0,
                rmse: 1.2,
                r2: 0.5,
                baseline_mae: quality_ratio,
                quality_ratio,
                decision_accuracy: 0.4,
                decision_quantiles: DecisionQuantiles {
                    lower: -0.01,
                    upper: 0.01,
                },
                target,
                train_rows: 100,
                test_rows: 25,
            },
            target_horizon: 1,
            use_baseline,
            blend_weight,
        }
    }

    fn table(signal: f64) -> FeatureTable {
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        FeatureTable::new(
            vec!["Other".to_string(), "Signal".to_string()],
            vec![
                FeatureRow {
                    timestamp: ts,
                    close: 90.0,
                    values: vec![0.0, -5.0],
                },
                FeatureRow {
                    timestamp: ts + chrono::Duration::days(1),
                    close: 100.0,
                    values: vec![0.0, signal],
                },
            ],
        )
    }

    #[test]
    fn test_advisory_uses_model_price() {
        let artifact = artifact(TargetEncoding::NextClosePrice, 1.3, false, 0.8);
        let result = predict_latest(&artifact, &table(104.0), &InferenceConfig::default()).unwrap();

        assert_eq!(result.current_price, 100.0);
        assert_eq!(result.model_price, 104.0);
        assert_eq!(result.final_price, 104.0);
        assert!((result.predicted_return - 0.04).abs() < 1e-12);
        assert_eq!(result.decision, DecisionLabel::Buy);
        assert_eq!(result.confidence, ConfidenceTier::High);
        assert_eq!(result.blend_weight, 1.0);
        assert!(!result.used_baseline);
    }

    #[test]
    fn test_advisory_ignores_untrusted_flag() {
        let artifact = artifact(TargetEncoding::NextClosePrice, 0.5, true, 0.0);
        let result = predict_latest(&artifact, &table(96.0), &InferenceConfig::default()).unwrap();

        assert_eq!(result.final_price, 96.0);
        assert!(!result.used_baseline);
        assert_eq!(result.confidence, ConfidenceTier::Low);
    }

    #[test]
    fn test_apply_blends_with_current_price() {
        let config = InferenceConfig {
            blend_mode: BlendMode::Apply,
            ..Default::default()
        };

        let weak = artifact(TargetEncoding::NextClosePrice, 0.9, false, 0.35);
        let result = predict_latest(&weak, &table(110.0), &config).unwrap();
        assert!((result.final_price - 103.5).abs() < 1e-9);
        assert_eq!(result.model_price, 110.0);
        assert_eq!(result.blend_weight, 0.35);
        assert_eq!(result.confidence, ConfidenceTier::Medium);

        let untrusted = artifact(TargetEncoding::NextClosePrice, 0.3, true, 0.0);
        let result = predict_latest(&untrusted, &table(110.0), &config).unwrap();
        assert_eq!(result.final_price, 100.0);
        assert_eq!(result.model_price, 110.0);
        // Return stays on the raw model price even when the blend falls back
        assert!((result.predicted_return - 0.10).abs() < 1e-12);
        assert!(result.used_baseline);
    }

    #[test]
    fn test_return_target_scaled_by_current_price() {
        let artifact = artifact(TargetEncoding::NextReturn, 1.1, false, 0.8);
        let result = predict_latest(&artifact, &table(-0.02), &InferenceConfig::default()).unwrap();

        assert!((result.model_price - 98.0).abs() < 1e-9);
        assert!((result.predicted_return + 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_missing_frozen_column_is_schema_error() {
        let artifact = artifact(TargetEncoding::NextClosePrice, 1.0, false, 0.8);
        let ts = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let table = FeatureTable::new(
            vec!["Other".to_string()],
            vec![FeatureRow {
                timestamp: ts,
                close: 100.0,
                values: vec![1.0],
            }],
        );

        let err = predict_latest(&artifact, &table, &InferenceConfig::default()).unwrap_err();
        match err {
            PredictionError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["Signal".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
