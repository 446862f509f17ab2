// Feature engineering, training and inference for the price pipeline
pub mod artifact_codec;
pub mod feature_engineering;
pub mod inference;
pub mod labeling;
pub mod metrics;
pub mod predictor;
pub mod smartcore_predictor;
pub mod training;

pub use artifact_codec::{ForestArtifact, decode_artifact, encode_artifact};
pub use feature_engineering::engineer_features;
pub use inference::predict_latest;
pub use predictor::{Classifier, Regressor};
pub use smartcore_predictor::{ForestClassifier, ForestRegressor};
pub use training::train_models;
