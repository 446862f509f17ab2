// Price data sources
pub mod csv_source;
pub mod mock;

pub use csv_source::CsvPriceSource;
pub use mock::MockPriceSource;
