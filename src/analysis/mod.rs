//! Dataset aggregation.

pub mod aggregator;

pub use aggregator::summarize;
