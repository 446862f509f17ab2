use crate::domain::errors::PredictionError;
use crate::domain::market::{HistoryPeriod, PriceSeries};

/// Supplies cleaned, chronologically ordered price history.
pub trait PriceDataSource: Send + Sync {
    fn fetch(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, PredictionError>;

    /// Human-readable provenance reported alongside predictions
    fn name(&self) -> &str;
}

/// Key-value blob store for trained artifacts, keyed by ticker.
///
/// `save` must replace a key atomically: a concurrent `load` sees either the
/// previous blob or the new one, never a partial write.
pub trait ArtifactStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PredictionError>;

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PredictionError>;

    /// Location of `key` for diagnostics (a path, or a logical name)
    fn describe(&self, key: &str) -> String {
        key.to_string()
    }
}
