//! Configuration module for dbdump
//!
//! This module provides configuration management including:
//! - Config file path resolution
//! - Settings loading, validation and persistence

pub mod paths;
pub mod settings;

pub use paths::DbdumpPaths;
pub use settings::{CompressionSettings, DatabaseConfig, DumpOptions, RsyncSettings, Settings};
