//! Dataset loading: column maps and the CSV loader.

pub mod columns;
pub mod loader;

pub use loader::{DatasetLoader, DatasetError};
