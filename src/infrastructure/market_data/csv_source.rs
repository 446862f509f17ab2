//! Daily price history from CSV files.
//!
//! One file per ticker, `<dir>/<TICKER>.csv`, with a header row. The `Date`
//! and `Close` columns are required, `Volume` is optional. Header matching
//! ignores case and surrounding whitespace, so exports like `Adj Close` next
//! to `Close` are fine as long as a plain `Close` column exists.

use crate::domain::errors::PredictionError;
use crate::domain::market::{HistoryPeriod, PriceBar, PriceSeries, artifact_key};
use crate::domain::ports::PriceDataSource;
use chrono::{DateTime, NaiveDate, Utc};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct CsvPriceSource {
    dir: PathBuf,
    name: String,
}

impl CsvPriceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let name = format!("csv:{}", dir.display());
        Self { dir, name }
    }

    /// File for `ticker`, with path separators replaced so it stays inside `dir`.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", artifact_key(ticker)))
    }

    fn read_bars(path: &Path) -> Result<Vec<PriceBar>, PredictionError> {
        let file = File::open(path).map_err(|e| {
            PredictionError::data(format!("Cannot open price file {:?}: {}", path, e))
        })?;
        let mut rdr = csv::Reader::from_reader(BufReader::new(file));

        let headers = rdr
            .headers()
            .map_err(|e| PredictionError::data(format!("Cannot read CSV header: {}", e)))?
            .clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let date_idx = find("date").ok_or_else(|| {
            PredictionError::data(format!("Price file {:?} has no Date column", path))
        })?;
        let close_idx = find("close").ok_or_else(|| {
            PredictionError::data(format!("Price file {:?} has no Close column", path))
        })?;
        let volume_idx = find("volume");

        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| {
                PredictionError::data(format!("Malformed CSV row {}: {}", line + 2, e))
            })?;

            let raw_date = record.get(date_idx).unwrap_or("").trim();
            let raw_close = record.get(close_idx).unwrap_or("").trim();
            if raw_date.is_empty() || raw_close.is_empty() {
                skipped += 1;
                continue;
            }

            let timestamp = parse_timestamp(raw_date).ok_or_else(|| {
                PredictionError::data(format!("Invalid date '{}' on row {}", raw_date, line + 2))
            })?;
            let close = raw_close.parse::<f64>().map_err(|e| {
                PredictionError::data(format!(
                    "Invalid close '{}' on row {}: {}",
                    raw_close,
                    line + 2,
                    e
                ))
            })?;
            let volume = match volume_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|v| !v.is_empty())
            {
                Some(raw) => Some(raw.parse::<f64>().map_err(|e| {
                    PredictionError::data(format!(
                        "Invalid volume '{}' on row {}: {}",
                        raw,
                        line + 2,
                        e
                    ))
                })?),
                None => None,
            };

            bars.push(PriceBar::new(timestamp, close, volume));
        }

        if skipped > 0 {
            warn!("Skipped {} rows with empty Date or Close in {:?}", skipped, path);
        }
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl PriceDataSource for CsvPriceSource {
    fn fetch(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, PredictionError> {
        let path = self.path_for(ticker);
        let mut bars = Self::read_bars(&path)?;

        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by_key(|bar| bar.timestamp);

        let series = PriceSeries::new(bars).trailing(period);
        if series.is_empty() {
            return Err(PredictionError::data(format!(
                "No price data for {} in period {}",
                ticker, period
            )));
        }
        series.validate()?;

        debug!("Read {} bars for {} from {:?}", series.len(), ticker, path);
        Ok(series)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
