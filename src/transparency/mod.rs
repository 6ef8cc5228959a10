//! Portal da Transparência API client.

pub mod client;

pub use client::{FetchError, TransparencyClient, DEFAULT_BASE_URL, MONTH_WINDOW};
