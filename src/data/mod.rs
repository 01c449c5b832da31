//! Data module - CSV loading and cleaning

pub mod columns;
mod loader;
mod processor;

pub use loader::{get_columns, require_columns, DataLoader, LoaderError};
pub use processor::{DataProcessor, ProcessorError, UNKNOWN_VACCINE};
