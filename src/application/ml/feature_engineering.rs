//! Technical feature derivation from raw price history.
//!
//! Every indicator is computed as a full column aligned with the input bars,
//! `None` where its warm-up window is not yet filled. Only rows where all
//! columns are defined make it into the resulting `FeatureTable`.

use crate::domain::config::FeatureConfig;
use crate::domain::errors::PredictionError;
use crate::domain::market::PriceSeries;
use crate::domain::ml::{FeatureRow, FeatureTable};
use statrs::statistics::{Data, Distribution};
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};
use tracing::{debug, warn};

type Column = Vec<Option<f64>>;

/// Derives the configured feature columns from `series`.
///
/// The input series is only read; all derived values go into a new table.
pub fn engineer_features(
    series: &PriceSeries,
    config: &FeatureConfig,
) -> Result<FeatureTable, PredictionError> {
    series.validate()?;

    let closes = series.closes();
    let mut columns: Vec<Column> = Vec::new();

    for &window in &config.ma_windows {
        columns.push(simple_moving_average(&closes, window)?);
    }

    let ema_fast = exponential_moving_average(&closes, config.ema_fast_span)?;
    let ema_slow = exponential_moving_average(&closes, config.ema_slow_span)?;
    let macd: Column = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(fast, slow)| Some(fast - slow))
        .collect();
    columns.push(ema_fast.into_iter().map(Some).collect());
    columns.push(ema_slow.into_iter().map(Some).collect());
    columns.push(macd);

    columns.push(relative_strength_index(
        &closes,
        config.rsi_period,
        config.rsi_epsilon,
    ));

    let short_returns = percent_change(&closes, config.short_return_period);
    let volatility = rolling_std_dev(&short_returns, config.volatility_window);
    columns.push(short_returns);
    columns.push(percent_change(&closes, config.long_return_period));
    columns.push(volatility);
    columns.push(volume_change(series));

    let names = config.column_names();
    debug_assert_eq!(names.len(), columns.len());

    let rows: Vec<FeatureRow> = series
        .bars()
        .iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let values: Option<Vec<f64>> = columns.iter().map(|col| col[i]).collect();
            values.map(|values| FeatureRow {
                timestamp: bar.timestamp,
                close: bar.close,
                values,
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(PredictionError::data(format!(
            "Feature engineering produced no rows from {} bars. Try using a longer data period.",
            series.len()
        )));
    }

    debug!(
        "Feature engineering kept {} of {} bars ({} columns)",
        rows.len(),
        series.len(),
        names.len()
    );

    Ok(FeatureTable::new(names, rows))
}

fn simple_moving_average(values: &[f64], window: usize) -> Result<Column, PredictionError> {
    let mut sma = SimpleMovingAverage::new(window).map_err(|e| {
        PredictionError::data(format!("invalid moving average window {}: {:?}", window, e))
    })?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let avg = sma.next(*v);
            (i + 1 >= window).then_some(avg)
        })
        .collect())
}

/// EMA seeded with the first value, smoothing factor `2 / (span + 1)`.
fn exponential_moving_average(values: &[f64], span: usize) -> Result<Vec<f64>, PredictionError> {
    let mut ema = ExponentialMovingAverage::new(span).map_err(|e| {
        PredictionError::data(format!("invalid EMA span {}: {:?}", span, e))
    })?;
    Ok(values.iter().map(|v| ema.next(*v)).collect())
}

/// Simple-average RSI over close-to-close differences.
///
/// Sums are taken over the exact window so a window without losses has an
/// average loss of exactly zero, which is then floored to `epsilon`.
fn relative_strength_index(closes: &[f64], period: usize, epsilon: f64) -> Column {
    let mut out = vec![None; closes.len()];

    for i in period..closes.len() {
        let mut gains = 0.0;
        let mut losses = 0.0;
        for j in (i + 1 - period)..=i {
            let delta = closes[j] - closes[j - 1];
            if delta > 0.0 {
                gains += delta;
            } else {
                losses -= delta;
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;
        let denominator = if avg_loss > 0.0 { avg_loss } else { epsilon };
        let rs = avg_gain / denominator;
        out[i] = Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0));
    }

    out
}

fn percent_change(values: &[f64], periods: usize) -> Column {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i >= periods).then(|| v / values[i - periods] - 1.0))
        .collect()
}

/// Sample standard deviation over a trailing window of defined values.
fn rolling_std_dev(values: &Column, window: usize) -> Column {
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
            Data::new(slice?).std_dev()
        })
        .collect()
}

fn volume_change(series: &PriceSeries) -> Column {
    let bars = series.bars();

    if !series.has_volume() {
        if bars.iter().any(|b| b.volume.is_some()) {
            warn!("Volume missing on some bars; VolumeChange set to zero");
        }
        return vec![Some(0.0); bars.len()];
    }

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                return None;
            }
            let previous = bars[i - 1].volume.unwrap_or(0.0);
            let current = bar.volume.unwrap_or(0.0);
            let change = current / previous - 1.0;
            Some(if change.is_finite() { change } else { 0.0 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::PriceBar;
    use crate::domain::ml::DEFAULT_FEATURE_COLUMNS;
    use chrono::{Duration, TimeZone, Utc};

    fn series_from(closes: &[f64], volumes: Option<&[f64]>) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    PriceBar::new(
                        start + Duration::days(i as i64),
                        *c,
                        volumes.map(|v| v[i]),
                    )
                })
                .collect(),
        )
    }

    fn wavy_closes(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin() + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn test_drops_warmup_rows() {
        let series = series_from(&wavy_closes(200), None);
        let table = engineer_features(&series, &FeatureConfig::default()).unwrap();

        // MA50 is the longest lookback: first defined row is bar 49
        assert_eq!(table.len(), 151);
        assert_eq!(table.rows()[0].timestamp, series.bars()[49].timestamp);
        assert_eq!(table.columns(), DEFAULT_FEATURE_COLUMNS);
        for row in table.rows() {
            assert_eq!(row.values.len(), DEFAULT_FEATURE_COLUMNS.len());
            assert!(row.values.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_moving_average_and_returns_values() {
        let closes = wavy_closes(120);
        let series = series_from(&closes, None);
        let table = engineer_features(&series, &FeatureConfig::default()).unwrap();
        let first = &table.rows()[0];

        let ma10: f64 = closes[40..50].iter().sum::<f64>() / 10.0;
        let ma50: f64 = closes[0..50].iter().sum::<f64>() / 50.0;
        assert!((first.values[0] - ma10).abs() < 1e-9);
        assert!((first.values[2] - ma50).abs() < 1e-9);

        let return1 = closes[49] / closes[48] - 1.0;
        let return5 = closes[49] / closes[44] - 1.0;
        assert!((first.values[7] - return1).abs() < 1e-12);
        assert!((first.values[8] - return5).abs() < 1e-12);
    }

    #[test]
    fn test_ema_is_unadjusted_recursion() {
        let closes = wavy_closes(80);
        let ema = exponential_moving_average(&closes, 12).unwrap();

        let alpha = 2.0 / 13.0;
        let mut expected = closes[0];
        for (i, close) in closes.iter().enumerate().skip(1) {
            expected = alpha * close + (1.0 - alpha) * expected;
            assert!((ema[i] - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rsi_bounded_without_losses() {
        let rising: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
        let rsi = relative_strength_index(&rising, 14, 1e-9);
        assert!(rsi[13].is_none());
        for value in rsi.iter().flatten() {
            assert!((0.0..=100.0).contains(value));
            assert!(*value > 99.9);
        }

        let flat = vec![42.0; 40];
        for value in relative_strength_index(&flat, 14, 1e-9).iter().flatten() {
            assert_eq!(*value, 0.0);
        }

        let falling: Vec<f64> = (0..40).map(|i| 100.0 - i as f64).collect();
        for value in relative_strength_index(&falling, 14, 1e-9).iter().flatten() {
            assert_eq!(*value, 0.0);
        }
    }

    #[test]
    fn test_rsi_matches_ratio_definition() {
        // Alternating +2 / -1 moves: avg gain 1.0, avg loss 0.5 over 14 deltas
        let mut closes = vec![100.0];
        for i in 0..30 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let rsi = relative_strength_index(&closes, 14, 1e-9);
        let expected = 100.0 - 100.0 / (1.0 + 2.0);
        assert!((rsi[14].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_volatility_is_sample_std() {
        let closes = wavy_closes(100);
        let table = engineer_features(&series_from(&closes, None), &FeatureConfig::default())
            .unwrap();

        let returns: Vec<f64> = (40..50).map(|i| closes[i] / closes[i - 1] - 1.0).collect();
        let mean = returns.iter().sum::<f64>() / 10.0;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 9.0;
        assert!((table.rows()[0].values[9] - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_volume_change_zero_without_volume() {
        let table =
            engineer_features(&series_from(&wavy_closes(120), None), &FeatureConfig::default())
                .unwrap();
        let volume_change = table.column("VolumeChange").unwrap();
        assert!(volume_change.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_volume_change_with_volume() {
        let closes = wavy_closes(120);
        let mut volumes: Vec<f64> = (0..120).map(|i| 1_000.0 + i as f64 * 10.0).collect();
        volumes[60] = 0.0;
        let table =
            engineer_features(&series_from(&closes, Some(&volumes)), &FeatureConfig::default())
                .unwrap();

        let volume_change = table.column("VolumeChange").unwrap();
        // First kept row is bar 49
        assert!((volume_change[0] - (volumes[49] / volumes[48] - 1.0)).abs() < 1e-12);
        // Change into zero is -100%, change out of zero is non-finite and zeroed
        assert!((volume_change[11] + 1.0).abs() < 1e-12);
        assert_eq!(volume_change[12], 0.0);
    }

    #[test]
    fn test_short_series_is_data_error() {
        let series = series_from(&wavy_closes(40), None);
        let err = engineer_features(&series, &FeatureConfig::default()).unwrap_err();
        assert!(matches!(err, PredictionError::Data { .. }));
    }

    #[test]
    fn test_input_series_is_untouched() {
        let series = series_from(&wavy_closes(100), None);
        let before = series.clone();
        engineer_features(&series, &FeatureConfig::default()).unwrap();
        assert_eq!(series, before);
    }
}
