//! Configuration module for scrape runs
//!
//! This module provides the `ScrapeConfig` struct, its validating builder
//! and the environment loader that maps the documented keys onto it.

// Sub-modules
pub mod builder;
pub mod env;
pub mod error;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::ScrapeConfigBuilder;
pub use error::ConfigError;
pub use types::{FilterBackendKind, ImageFilterSettings, ScrapeConfig};
