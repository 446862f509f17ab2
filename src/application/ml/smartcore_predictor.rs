use super::predictor::{Classifier, Regressor};
use crate::domain::config::ForestParams;
use crate::domain::errors::PredictionError;
use crate::domain::ml::DecisionLabel;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

type ForestRegressorModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type ForestClassifierModel = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

fn to_matrix(features: &[Vec<f64>], stage: &'static str) -> Result<DenseMatrix<f64>, PredictionError> {
    if features.is_empty() {
        return Err(PredictionError::model(stage, "empty feature matrix"));
    }
    DenseMatrix::from_2d_vec(&features.to_vec())
        .map_err(|e| PredictionError::model(stage, format!("Matrix creation failed: {}", e)))
}

/// SmartCore random forest predicting the regression target.
#[derive(Serialize, Deserialize)]
pub struct ForestRegressor {
    model: ForestRegressorModel,
    n_trees: u16,
}

impl Regressor for ForestRegressor {
    fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
    ) -> Result<Self, PredictionError> {
        let x = to_matrix(features, "regressor fit")?;

        let mut parameters = RandomForestRegressorParameters::default()
            .with_n_trees(params.n_estimators.into())
            .with_min_samples_split(params.min_samples_split)
            .with_seed(params.random_state);
        if let Some(depth) = params.max_depth {
            parameters = parameters.with_max_depth(depth);
        }

        debug!(
            "Fitting Random Forest Regressor (Trees: {}, Rows: {})",
            params.n_estimators,
            features.len()
        );
        let model = RandomForestRegressor::fit(&x, &targets.to_vec(), parameters)
            .map_err(|e| PredictionError::model("regressor fit", e))?;

        Ok(Self {
            model,
            n_trees: params.n_estimators,
        })
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError> {
        let x = to_matrix(features, "regressor predict")?;
        self.model
            .predict(&x)
            .map_err(|e| PredictionError::model("regressor predict", e))
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest Regressor"
    }
}

impl fmt::Debug for ForestRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForestRegressor")
            .field("n_trees", &self.n_trees)
            .finish_non_exhaustive()
    }
}

/// SmartCore random forest over decision labels.
///
/// A training partition with a single label cannot be split by a tree, so it
/// is stored as a constant prediction instead.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForestClassifier {
    Forest { model: ForestClassifierModel, n_trees: u16 },
    Constant { label: DecisionLabel },
}

impl Classifier for ForestClassifier {
    fn fit(
        features: &[Vec<f64>],
        labels: &[DecisionLabel],
        params: &ForestParams,
    ) -> Result<Self, PredictionError> {
        let distinct: BTreeSet<DecisionLabel> = labels.iter().copied().collect();
        let mut iter = distinct.iter();
        match (iter.next(), iter.next()) {
            (None, _) => {
                return Err(PredictionError::model("classifier fit", "no training labels"));
            }
            (Some(only), None) => {
                debug!("Single decision label {} in training partition", only);
                return Ok(ForestClassifier::Constant { label: *only });
            }
            _ => {}
        }

        let x = to_matrix(features, "classifier fit")?;
        let y: Vec<i32> = labels.iter().map(|l| l.class_id()).collect();

        let mut parameters = RandomForestClassifierParameters::default()
            .with_n_trees(params.n_estimators.into())
            .with_min_samples_split(params.min_samples_split)
            .with_seed(params.random_state);
        if let Some(depth) = params.max_depth {
            parameters = parameters.with_max_depth(depth);
        }

        debug!(
            "Fitting Random Forest Classifier (Trees: {}, Classes: {})",
            params.n_estimators,
            distinct.len()
        );
        let model = RandomForestClassifier::fit(&x, &y, parameters)
            .map_err(|e| PredictionError::model("classifier fit", e))?;

        Ok(ForestClassifier::Forest {
            model,
            n_trees: params.n_estimators,
        })
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<DecisionLabel>, PredictionError> {
        match self {
            ForestClassifier::Constant { label } => Ok(vec![*label; features.len()]),
            ForestClassifier::Forest { model, .. } => {
                let x = to_matrix(features, "classifier predict")?;
                let classes = model
                    .predict(&x)
                    .map_err(|e| PredictionError::model("classifier predict", e))?;
                classes
                    .into_iter()
                    .map(|id| {
                        DecisionLabel::from_class_id(id).ok_or_else(|| {
                            PredictionError::model(
                                "classifier predict",
                                format!("unknown class id {}", id),
                            )
                        })
                    })
                    .collect()
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            ForestClassifier::Forest { .. } => "SmartCore Random Forest Classifier",
            ForestClassifier::Constant { .. } => "Constant Classifier",
        }
    }
}

impl fmt::Debug for ForestClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForestClassifier::Forest { n_trees, .. } => f
                .debug_struct("ForestClassifier::Forest")
                .field("n_trees", n_trees)
                .finish_non_exhaustive(),
            ForestClassifier::Constant { label } => f
                .debug_struct("ForestClassifier::Constant")
                .field("label", label)
                .finish(),
        }
    }
}
