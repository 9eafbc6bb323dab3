//! Curriculum resource portal: the taxonomy catalog, the filename classifier and bulk PDF
//! importer built on it, and resource upload/viewing with its HTTP surface.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod import;
pub mod resources;
pub mod telemetry;

pub use error::AppError;
