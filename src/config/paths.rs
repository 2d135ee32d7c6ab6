//! Path management for dbdump
//!
//! Resolves where the configuration file lives and where dumps go by default.
//!
//! ## Path Resolution Order
//!
//! 1. `DBDUMP_CONFIG_DIR` environment variable (if set)
//! 2. Platform config directory (`~/.config/dbdump` on Linux)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::DbdumpError;

/// Environment variable overriding the base directory
pub const CONFIG_DIR_ENV: &str = "DBDUMP_CONFIG_DIR";

/// Environment variable pointing at an explicit config file
pub const CONFIG_FILE_ENV: &str = "DBDUMP_CONFIG";

/// Manages all paths used by dbdump
#[derive(Debug, Clone)]
pub struct DbdumpPaths {
    /// Base directory for configuration and default dump storage
    base_dir: PathBuf,
    /// Explicit config file, overriding `<base>/config.json`
    config_file: Option<PathBuf>,
}

impl DbdumpPaths {
    /// Create a new DbdumpPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no platform config directory can be determined
    /// and `DBDUMP_CONFIG_DIR` is unset.
    pub fn new() -> Result<Self, DbdumpError> {
        let base_dir = if let Ok(custom) = std::env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        Ok(Self {
            base_dir,
            config_file,
        })
    }

    /// Create DbdumpPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            config_file: None,
        }
    }

    /// Point at an explicit config file, e.g. from `--config`
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the config file
    pub fn config_file(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.base_dir.join("config.json"))
    }

    /// Dump directory used when the config does not name one
    pub fn default_dump_dir(&self) -> PathBuf {
        self.base_dir.join("dumps")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), DbdumpError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| DbdumpError::Io(format!("Failed to create base directory: {}", e)))
    }
}

fn resolve_default_path() -> Result<PathBuf, DbdumpError> {
    ProjectDirs::from("", "", "dbdump")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| DbdumpError::Config("Could not determine config directory".into()))
}
