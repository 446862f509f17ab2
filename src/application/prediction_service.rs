//! Train / infer orchestration for one ticker per call.
//!
//! ```text
//! force_retrain ──► Train ──► Infer ──► report
//!                     ▲         │
//!                     └─────────┘  missing or unreadable artifact, once
//! ```
//!
//! Any other failure, or a second artifact failure after training, is
//! returned to the caller unchanged.

use crate::application::ml::{
    Classifier, ForestClassifier, ForestRegressor, Regressor, decode_artifact, encode_artifact,
    engineer_features, predict_latest, train_models,
};
use crate::domain::config::{FeatureConfig, PipelineConfig};
use crate::domain::errors::PredictionError;
use crate::domain::market::{HistoryPeriod, PriceSeries, artifact_key, normalize_ticker};
use crate::domain::ml::{
    FeatureRow, FeatureTable, ModelArtifact, PredictionReport, PredictionResult, TrainingSummary,
};
use crate::domain::ports::{ArtifactStore, PriceDataSource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of trailing closes included in a report.
pub const RECENT_CLOSES: usize = 30;

const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Train,
    Infer,
}

/// Entry point of the pipeline: fetch, engineer, (re)train, infer.
pub struct PredictionService<R = ForestRegressor, C = ForestClassifier> {
    source: Arc<dyn PriceDataSource>,
    store: Arc<dyn ArtifactStore>,
    config: PipelineConfig,
    _models: PhantomData<fn() -> (R, C)>,
}

impl PredictionService {
    /// Service backed by the random forest models.
    pub fn new(
        source: Arc<dyn PriceDataSource>,
        store: Arc<dyn ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self::with_backend(source, store, config)
    }
}

impl<R, C> PredictionService<R, C>
where
    R: Regressor + Serialize + DeserializeOwned,
    C: Classifier + Serialize + DeserializeOwned,
{
    pub fn with_backend(
        source: Arc<dyn PriceDataSource>,
        store: Arc<dyn ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            _models: PhantomData,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Predicts the next close for `ticker`.
    ///
    /// Trains first when `force_retrain` is set. Otherwise a missing or
    /// undecodable artifact triggers exactly one training pass before
    /// inference is retried.
    pub fn run(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        force_retrain: bool,
    ) -> Result<PredictionReport, PredictionError> {
        let ticker = normalize_ticker(ticker)?;
        let key = artifact_key(&ticker);

        let series = self.source.fetch(&ticker, period)?;
        let table = engineer_features(&series, &self.config.features)?;
        info!(
            "Loaded {} bars for {} from {} ({} feature rows)",
            series.len(),
            ticker,
            self.source.name(),
            table.len()
        );

        let mut stage = if force_retrain {
            Stage::Train
        } else {
            Stage::Infer
        };
        let mut fresh: Option<ModelArtifact<R, C>> = None;
        let mut model_trained = false;

        loop {
            debug!("{}: entering {:?} stage", ticker, stage);
            match stage {
                Stage::Train => {
                    fresh = Some(self.train_and_save(&ticker, &key, &table)?);
                    model_trained = true;
                    stage = Stage::Infer;
                }
                Stage::Infer => {
                    let attempt = match fresh.take() {
                        Some(artifact) => Ok(artifact),
                        None => self.load_artifact(&ticker, &key),
                    }
                    .and_then(|artifact| {
                        let prediction =
                            predict_latest(&artifact, &table, &self.config.inference)?;
                        Ok((artifact, prediction))
                    });

                    match attempt {
                        Ok((artifact, prediction)) => {
                            return self.build_report(
                                &ticker,
                                &key,
                                period,
                                &series,
                                &table,
                                &artifact,
                                prediction,
                                model_trained,
                            );
                        }
                        Err(err) if err.is_artifact_recoverable() && !model_trained => {
                            warn!("{}: {}. Retraining once.", ticker, err);
                            stage = Stage::Train;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }

    /// Trains and persists a model for `ticker` without running inference.
    pub fn train(
        &self,
        ticker: &str,
        period: HistoryPeriod,
    ) -> Result<TrainingSummary, PredictionError> {
        let ticker = normalize_ticker(ticker)?;
        let key = artifact_key(&ticker);

        let series = self.source.fetch(&ticker, period)?;
        let table = engineer_features(&series, &self.config.features)?;
        let artifact = self.train_and_save(&ticker, &key, &table)?;

        Ok(TrainingSummary {
            ticker,
            model_key: self.store.describe(&key),
            trained_at: artifact.trained_at,
            target_horizon: artifact.target_horizon,
            feature_columns: artifact.feature_columns,
            use_baseline: artifact.use_baseline,
            blend_weight: artifact.blend_weight,
            metrics: artifact.metrics,
            data_rows: table.len(),
        })
    }

    fn train_and_save(
        &self,
        ticker: &str,
        key: &str,
        table: &FeatureTable,
    ) -> Result<ModelArtifact<R, C>, PredictionError> {
        let artifact = train_models::<R, C>(ticker, table, &self.config)?;
        let blob = encode_artifact(&artifact)?;
        self.store.save(key, &blob)?;
        info!(
            "Saved model for {} to {} (quality ratio {:.3}, blend weight {})",
            ticker,
            self.store.describe(key),
            artifact.metrics.quality_ratio,
            artifact.blend_weight
        );
        Ok(artifact)
    }

    fn load_artifact(&self, ticker: &str, key: &str) -> Result<ModelArtifact<R, C>, PredictionError> {
        let blob = self
            .store
            .load(key)?
            .ok_or_else(|| PredictionError::NotTrained {
                ticker: ticker.to_string(),
            })?;
        decode_artifact(key, &blob)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_report(
        &self,
        ticker: &str,
        key: &str,
        period: HistoryPeriod,
        series: &PriceSeries,
        table: &FeatureTable,
        artifact: &ModelArtifact<R, C>,
        prediction: PredictionResult,
        model_trained: bool,
    ) -> Result<PredictionReport, PredictionError> {
        let volatility_idx = table.resolve_columns(&[FeatureConfig::VOLATILITY_COLUMN.to_string()])?;
        let recent_volatility = table
            .latest()
            .map(|row| row.values[volatility_idx[0]])
            .unwrap_or_default();

        let bars = series.bars();
        let recent_close_prices = bars
            .iter()
            .skip(bars.len().saturating_sub(RECENT_CLOSES))
            .map(|bar| bar.close)
            .collect();
        // Data range covers the rows that survived feature warm-up
        let rows = table.rows();
        let format_date = |row: Option<&FeatureRow>| {
            row.map(|row| row.timestamp.format(REPORT_DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        Ok(PredictionReport {
            ticker: ticker.to_string(),
            current_price: prediction.current_price,
            predicted_price: prediction.final_price,
            model_price: prediction.model_price,
            predicted_return: prediction.predicted_return,
            decision: prediction.decision,
            used_baseline: prediction.used_baseline,
            blend_weight: prediction.blend_weight,
            confidence: prediction.confidence,
            recent_volatility,
            model_trained,
            trained_at: artifact.trained_at,
            target_horizon: artifact.target_horizon,
            metrics: artifact.metrics.clone(),
            recent_close_prices,
            data_source: self.source.name().to_string(),
            data_period: period.to_string(),
            data_rows: rows.len(),
            data_start: format_date(rows.first()),
            data_end: format_date(rows.last()),
            model_key: self.store.describe(key),
        })
    }
}
