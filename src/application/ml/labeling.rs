//! Forward-return targets and tertile decision labels.

use crate::domain::errors::PredictionError;
use crate::domain::ml::{DecisionLabel, DecisionQuantiles, FeatureTable, TargetEncoding};

const PRIMARY_PERCENTILES: (f64, f64) = (33.0, 67.0);
const FALLBACK_PERCENTILES: (f64, f64) = (30.0, 70.0);

/// Feature rows paired with their forward outcome.
///
/// Row `i` looks `horizon` rows ahead, so the last `horizon` table rows have
/// no outcome and are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub features: Vec<Vec<f64>>,
    pub current_closes: Vec<f64>,
    pub future_closes: Vec<f64>,
    pub future_returns: Vec<f64>,
    pub labels: Vec<DecisionLabel>,
    pub quantiles: DecisionQuantiles,
}

impl LabeledDataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Regression targets in the requested encoding.
    pub fn targets(&self, encoding: TargetEncoding) -> Vec<f64> {
        match encoding {
            TargetEncoding::NextClosePrice => self.future_closes.clone(),
            TargetEncoding::NextReturn => self.future_returns.clone(),
        }
    }
}

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is in [0, 100]. Returns `None` for an empty input.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Tertile thresholds of `returns`, widened to 30/70 when the tertiles coincide.
pub fn decision_thresholds(returns: &[f64]) -> Option<DecisionQuantiles> {
    let (low_p, high_p) = PRIMARY_PERCENTILES;
    let mut lower = percentile(returns, low_p)?;
    let mut upper = percentile(returns, high_p)?;

    if lower >= upper {
        let (low_p, high_p) = FALLBACK_PERCENTILES;
        lower = percentile(returns, low_p)?;
        upper = percentile(returns, high_p)?;
    }

    Some(DecisionQuantiles { lower, upper })
}

/// Labels one forward return against the thresholds.
///
/// When both thresholds are the same value, values equal to it are HOLD and
/// everything else is split strictly around it, so a varying return series
/// still yields at least two labels.
pub fn assign_label(future_return: f64, quantiles: &DecisionQuantiles) -> DecisionLabel {
    if quantiles.lower >= quantiles.upper {
        let threshold = quantiles.lower;
        return if future_return < threshold {
            DecisionLabel::Sell
        } else if future_return > threshold {
            DecisionLabel::Buy
        } else {
            DecisionLabel::Hold
        };
    }

    if future_return <= quantiles.lower {
        DecisionLabel::Sell
    } else if future_return >= quantiles.upper {
        DecisionLabel::Buy
    } else {
        DecisionLabel::Hold
    }
}

/// Pairs each usable row of `table` with its forward close, return and label.
///
/// `columns` selects and orders the feature values (see
/// `FeatureTable::resolve_columns`).
pub fn build_labeled_dataset(
    table: &FeatureTable,
    columns: &[usize],
    horizon: usize,
) -> Result<LabeledDataset, PredictionError> {
    let rows = table.rows();
    let usable = rows.len().saturating_sub(horizon);
    if usable == 0 {
        return Err(PredictionError::InsufficientData {
            rows: 0,
            required: 1,
        });
    }

    let mut features = Vec::with_capacity(usable);
    let mut current_closes = Vec::with_capacity(usable);
    let mut future_closes = Vec::with_capacity(usable);
    let mut future_returns = Vec::with_capacity(usable);

    for (row, ahead) in rows.iter().zip(rows.iter().skip(horizon)) {
        features.push(row.project(columns));
        current_closes.push(row.close);
        future_closes.push(ahead.close);
        future_returns.push(ahead.close / row.close - 1.0);
    }

    let quantiles = decision_thresholds(&future_returns).ok_or_else(|| {
        PredictionError::data("Cannot compute decision thresholds without forward returns")
    })?;
    let labels = future_returns
        .iter()
        .map(|r| assign_label(*r, &quantiles))
        .collect();

    Ok(LabeledDataset {
        features,
        current_closes,
        future_closes,
        future_returns,
        labels,
        quantiles,
    })
}
