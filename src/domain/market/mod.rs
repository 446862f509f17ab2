// Price history domain
pub mod period;
pub mod price_series;

pub use period::HistoryPeriod;
pub use price_series::{PriceBar, PriceSeries, artifact_key, normalize_ticker};
