//! Configuration module for the terminology mapper.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for mapping storage
//! and diff extraction, `AppPaths` for cross-platform directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, ExtractConfig, MappingConfig, MAPPING_FILE_ENV};
