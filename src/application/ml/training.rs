//! Dual-model training with a persistence-baseline quality gate.

use super::labeling::build_labeled_dataset;
use super::metrics::{accuracy, mean_absolute_error, r2_score, root_mean_squared_error};
use super::predictor::{Classifier, Regressor};
use crate::domain::config::PipelineConfig;
use crate::domain::errors::PredictionError;
use crate::domain::ml::{
    ARTIFACT_FORMAT_VERSION, FeatureTable, ModelArtifact, TrainingMetrics, TrustAssessment,
    quality_ratio,
};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Chronological split point: both partitions keep at least one row.
pub fn split_index(rows: usize, ratio: f64) -> usize {
    if rows < 2 {
        return rows;
    }
    let raw = (rows as f64 * ratio).floor() as usize;
    raw.max(1).min(rows - 1)
}

/// Fits the price regressor and decision classifier for one ticker.
///
/// Rows are split chronologically, both models are fitted on the earlier
/// partition and scored on the later one against a "next close equals
/// current close" baseline. The resulting quality ratio decides the trust
/// gate stored in the artifact.
pub fn train_models<R, C>(
    ticker: &str,
    table: &FeatureTable,
    config: &PipelineConfig,
) -> Result<ModelArtifact<R, C>, PredictionError>
where
    R: Regressor,
    C: Classifier,
{
    let training = &config.training;
    let feature_columns = config.features.column_names();
    let indices = table.resolve_columns(&feature_columns)?;

    let usable = table.len().saturating_sub(training.target_horizon);
    if usable < training.min_training_rows {
        return Err(PredictionError::InsufficientData {
            rows: usable,
            required: training.min_training_rows,
        });
    }

    let dataset = build_labeled_dataset(table, &indices, training.target_horizon)?;
    let split = split_index(dataset.len(), training.train_split_ratio);
    let targets = dataset.targets(training.target_encoding);

    let (x_train, x_test) = dataset.features.split_at(split);
    let (y_train, _) = targets.split_at(split);
    let (labels_train, labels_test) = dataset.labels.split_at(split);

    info!(
        "Training models for {} on {} rows ({} train / {} test, target {})",
        ticker,
        dataset.len(),
        x_train.len(),
        x_test.len(),
        training.target_encoding
    );

    let params = &training.forest;
    let (regressor, classifier) = rayon::join(
        || R::fit(x_train, y_train, params),
        || C::fit(x_train, labels_train, params),
    );
    let regressor = regressor?;
    let classifier = classifier?;
    debug!(
        "Fitted {} and {} for {}",
        regressor.name(),
        classifier.name(),
        ticker
    );

    let current_test = &dataset.current_closes[split..];
    let actual_test = &dataset.future_closes[split..];

    let raw_predictions = regressor.predict(x_test)?;
    let predicted_prices: Vec<f64> = raw_predictions
        .iter()
        .zip(current_test)
        .map(|(raw, current)| training.target_encoding.to_price(*raw, *current))
        .collect();

    let mae = mean_absolute_error(actual_test, &predicted_prices);
    let rmse = root_mean_squared_error(actual_test, &predicted_prices);
    let r2 = r2_score(actual_test, &predicted_prices);
    let baseline_mae = mean_absolute_error(actual_test, current_test);
    let ratio = quality_ratio(baseline_mae, mae);

    let predicted_labels = classifier.predict(x_test)?;
    let decision_accuracy = accuracy(labels_test, &predicted_labels);

    let gate = TrustAssessment::from_quality_ratio(ratio, &config.trust);

    info!(
        "OOS metrics for {}: MAE={:.4}, RMSE={:.4}, R2={:.4}, baseline MAE={:.4}, quality ratio={:.3}, decision accuracy={:.1}%",
        ticker,
        mae,
        rmse,
        r2,
        baseline_mae,
        ratio,
        decision_accuracy * 100.0
    );
    if gate.use_baseline {
        warn!(
            "Model for {} is well behind the persistence baseline (quality ratio {:.3}); marked untrusted",
            ticker, ratio
        );
    }

    Ok(ModelArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        ticker: ticker.to_string(),
        price_model: regressor,
        decision_model: classifier,
        feature_columns,
        trained_at: Utc::now(),
        metrics: TrainingMetrics {
            mae,
            rmse,
            r2,
            baseline_mae,
            quality_ratio: ratio,
            decision_accuracy,
            decision_quantiles: dataset.quantiles,
            target: training.target_encoding,
            train_rows: x_train.len(),
            test_rows: x_test.len(),
        },
        target_horizon: training.target_horizon,
        use_baseline: gate.use_baseline,
        blend_weight: gate.blend_weight,
    })
}
