use crate::domain::errors::PredictionError;
use crate::domain::market::{HistoryPeriod, PriceSeries};
use crate::domain::ports::PriceDataSource;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Serves fixed price series registered per ticker.
#[derive(Debug, Default)]
pub struct MockPriceSource {
    series: RwLock<HashMap<String, PriceSeries>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(ticker: &str, series: PriceSeries) -> Self {
        let source = Self::new();
        source.insert(ticker, series);
        source
    }

    pub fn insert(&self, ticker: &str, series: PriceSeries) {
        self.series.write().insert(ticker.to_uppercase(), series);
    }
}

impl PriceDataSource for MockPriceSource {
    fn fetch(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, PredictionError> {
        let series = self
            .series
            .read()
            .get(ticker)
            .map(|s| s.trailing(period))
            .ok_or_else(|| PredictionError::data(format!("No data returned for {}", ticker)))?;

        debug!("MockPriceSource: serving {} bars for {}", series.len(), ticker);
        Ok(series)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_serves_registered_series() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..20)
            .map(|i| PriceBar::new(start + Duration::days(i), 10.0 + i as f64, None))
            .collect();
        let source = MockPriceSource::with_series("spy", PriceSeries::new(bars));

        assert_eq!(source.fetch("SPY", HistoryPeriod::Max).unwrap().len(), 20);
        assert_eq!(source.fetch("SPY", HistoryPeriod::Days(5)).unwrap().len(), 5);
        assert!(matches!(
            source.fetch("QQQ", HistoryPeriod::Max),
            Err(PredictionError::Data { .. })
        ));
    }
}
