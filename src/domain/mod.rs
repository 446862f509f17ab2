// Pipeline configuration value objects
pub mod config;

// Price history domain
pub mod market;

// Features, labels, artifacts and trust signals
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
