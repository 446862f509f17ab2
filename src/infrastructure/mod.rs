// Price data sources
pub mod market_data;

// Artifact stores
pub mod persistence;
