//! Feature window configuration.
//!
//! Column names are derived from the windows, so the defaults produce the
//! canonical column list in `domain::ml::feature_registry::DEFAULT_FEATURE_COLUMNS`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Simple moving average windows
    pub ma_windows: Vec<usize>,
    pub ema_fast_span: usize,
    pub ema_slow_span: usize,
    pub rsi_period: usize,
    /// Floor for the average loss when a window has no losses
    pub rsi_epsilon: f64,
    pub short_return_period: usize,
    pub long_return_period: usize,
    /// Window for the std-dev of short-period returns
    pub volatility_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![10, 20, 50],
            ema_fast_span: 12,
            ema_slow_span: 26,
            rsi_period: 14,
            rsi_epsilon: 1e-9,
            short_return_period: 1,
            long_return_period: 5,
            volatility_window: 10,
        }
    }
}

impl FeatureConfig {
    pub const MACD_COLUMN: &'static str = "MACD";
    pub const VOLATILITY_COLUMN: &'static str = "Volatility";
    pub const VOLUME_CHANGE_COLUMN: &'static str = "VolumeChange";

    pub fn ma_column(window: usize) -> String {
        format!("MA{}", window)
    }

    pub fn ema_column(span: usize) -> String {
        format!("EMA{}", span)
    }

    pub fn rsi_column(&self) -> String {
        format!("RSI{}", self.rsi_period)
    }

    pub fn return_column(period: usize) -> String {
        format!("Return{}", period)
    }

    /// Ordered column list produced by feature engineering.
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .ma_windows
            .iter()
            .map(|w| Self::ma_column(*w))
            .collect();
        names.push(Self::ema_column(self.ema_fast_span));
        names.push(Self::ema_column(self.ema_slow_span));
        names.push(Self::MACD_COLUMN.to_string());
        names.push(self.rsi_column());
        names.push(Self::return_column(self.short_return_period));
        names.push(Self::return_column(self.long_return_period));
        names.push(Self::VOLATILITY_COLUMN.to_string());
        names.push(Self::VOLUME_CHANGE_COLUMN.to_string());
        names
    }
}
