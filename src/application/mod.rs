// Prediction pipeline stages and model backends
pub mod ml;

// Train / infer orchestration
pub mod prediction_service;
