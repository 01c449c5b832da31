//! EU Vaccine Report - download ECDC vaccination data, aggregate per
//! country and vaccine type, and render static charts.

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod data;
pub mod fetch;
pub mod pipeline;

pub use data::columns as COL;
pub use pipeline::Pipeline;
