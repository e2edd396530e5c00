// News items and their publication metadata
pub mod news;

// Per-ticker price and market indicators
pub mod indicators;

// Buy/Sell signals produced by the model
pub mod signals;

// Persisted run report
pub mod report;

// Progress events emitted during a run
pub mod progress;

// Port interfaces
pub mod ports;
pub mod repositories;

// Domain-specific error types
pub mod errors;
