use anyhow::{Result, anyhow};
use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of price history requested from a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryPeriod {
    Days(u32),
    Months(u32),
    Years(u32),
    YearToDate,
    Max,
}

impl HistoryPeriod {
    /// Earliest timestamp covered by this period when the history ends at `end`.
    ///
    /// Returns `None` for `Max` (no lower bound).
    pub fn window_start(&self, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            HistoryPeriod::Days(days) => Some(end - chrono::Duration::days(i64::from(*days))),
            HistoryPeriod::Months(months) => end.checked_sub_months(Months::new(*months)),
            HistoryPeriod::Years(years) => {
                end.checked_sub_months(Months::new(years.saturating_mul(12)))
            }
            HistoryPeriod::YearToDate => Utc
                .with_ymd_and_hms(end.year(), 1, 1, 0, 0, 0)
                .single(),
            HistoryPeriod::Max => None,
        }
    }
}

impl Default for HistoryPeriod {
    fn default() -> Self {
        HistoryPeriod::Years(5)
    }
}

impl FromStr for HistoryPeriod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "ytd" => return Ok(HistoryPeriod::YearToDate),
            "max" => return Ok(HistoryPeriod::Max),
            _ => {}
        }

        let split = normalized
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| anyhow!("Invalid period: {}. Missing unit (d, mo, y)", s))?;
        let (count, unit) = normalized.split_at(split);
        let count: u32 = count
            .parse()
            .map_err(|_| anyhow!("Invalid period: {}. Expected e.g. 5d, 6mo, 5y, ytd, max", s))?;
        if count == 0 {
            return Err(anyhow!("Invalid period: {}. Length must be positive", s));
        }

        match unit {
            "d" => Ok(HistoryPeriod::Days(count)),
            "mo" => Ok(HistoryPeriod::Months(count)),
            "y" => Ok(HistoryPeriod::Years(count)),
            _ => Err(anyhow!("Invalid period unit in {}. Must be d, mo or y", s)),
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPeriod::Days(n) => write!(f, "{}d", n),
            HistoryPeriod::Months(n) => write!(f, "{}mo", n),
            HistoryPeriod::Years(n) => write!(f, "{}y", n),
            HistoryPeriod::YearToDate => write!(f, "ytd"),
            HistoryPeriod::Max => write!(f, "max"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_periods() {
        assert_eq!("5y".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::Years(5));
        assert_eq!("6mo".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::Months(6));
        assert_eq!("30D".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::Days(30));
        assert_eq!("ytd".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::YearToDate);
        assert_eq!(" max ".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::Max);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<HistoryPeriod>().is_err());
        assert!("5".parse::<HistoryPeriod>().is_err());
        assert!("0y".parse::<HistoryPeriod>().is_err());
        assert!("5w".parse::<HistoryPeriod>().is_err());
        assert!("y".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for p in ["5d", "3mo", "10y", "ytd", "max"] {
            let period: HistoryPeriod = p.parse().unwrap();
            assert_eq!(period.to_string(), p);
        }
    }

    #[test]
    fn test_window_start() {
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();

        assert_eq!(
            HistoryPeriod::Days(10).window_start(end),
            Some(Utc.with_ymd_and_hms(2024, 6, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(
            HistoryPeriod::Years(1).window_start(end),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(
            HistoryPeriod::YearToDate.window_start(end),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(HistoryPeriod::Max.window_start(end), None);
    }
}
