// Model artifact, labels and trust signals
pub mod artifact;
pub mod decision;
pub mod feature_registry;
pub mod prediction;
pub mod quality;

pub use artifact::{
    ARTIFACT_FORMAT_VERSION, DecisionQuantiles, ModelArtifact, TargetEncoding, TrainingMetrics,
};
pub use decision::DecisionLabel;
pub use feature_registry::{DEFAULT_FEATURE_COLUMNS, FeatureRow, FeatureTable};
pub use prediction::{PredictionReport, PredictionResult, TrainingSummary};
pub use quality::{ConfidenceTier, TrustAssessment, quality_ratio};
