//! Output rendering for listings, summaries, and external metrics.

pub mod generator;

pub use generator::CurrencyFormat;
