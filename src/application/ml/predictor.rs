use crate::domain::config::ForestParams;
use crate::domain::errors::PredictionError;
use crate::domain::ml::DecisionLabel;

/// Supervised regressor predicting one value per feature row.
///
/// Implementations must be deterministic for a fixed `random_state` so that a
/// persisted model reproduces its predictions after reload.
pub trait Regressor: Sized + Send {
    fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
    ) -> Result<Self, PredictionError>;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Supervised classifier predicting a `DecisionLabel` per feature row.
pub trait Classifier: Sized + Send {
    fn fit(
        features: &[Vec<f64>],
        labels: &[DecisionLabel],
        params: &ForestParams,
    ) -> Result<Self, PredictionError>;

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<DecisionLabel>, PredictionError>;

    /// Get model name/type
    fn name(&self) -> &str;
}
