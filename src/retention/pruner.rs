//! Retention pruner for dbdump
//!
//! Lists the dumps of an alias and deletes all but the newest N. Dump names
//! sort chronologically as strings, so "newest" means "lexicographically
//! greatest".

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Settings;
use crate::dump::{alias_of, alias_prefix};
use crate::error::{DbdumpError, DbdumpResult};

/// Metadata about a dump file
#[derive(Debug, Clone)]
pub struct DumpInfo {
    pub alias: String,
    pub filename: String,
    /// Full path to the dump
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Whether the file carries the compression extension
    pub compressed: bool,
}

/// Manages dump retention in one directory
pub struct RetentionPruner {
    /// Path to dump directory
    dump_dir: PathBuf,
}

impl RetentionPruner {
    /// Create a new RetentionPruner
    pub fn new(dump_dir: impl Into<PathBuf>) -> Self {
        Self {
            dump_dir: dump_dir.into(),
        }
    }

    /// Get dump directory path
    pub fn dump_dir(&self) -> &Path {
        &self.dump_dir
    }

    /// All dump files of an alias, oldest first
    ///
    /// A name must both start with `<alias>__` and parse back to `alias`, so
    /// the dumps of `legacy__db` never count as dumps of `legacy`.
    pub fn alias_dumps(&self, alias: &str) -> DbdumpResult<Vec<PathBuf>> {
        if !self.dump_dir.exists() {
            return Ok(Vec::new());
        }

        let prefix = alias_prefix(alias);
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.dump_dir).map_err(|e| {
            DbdumpError::Io(format!("Failed to read dump directory: {}", e))
        })? {
            let entry = entry.map_err(|e| {
                DbdumpError::Io(format!("Failed to read directory entry: {}", e))
            })?;

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && alias_of(&name) == Some(alias) {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Delete all but the newest `max_dumps` dumps of an alias
    ///
    /// `max_dumps == 0` keeps everything. Returns the deleted paths. The
    /// first failed deletion stops pruning and is returned as the error.
    pub fn prune(&self, alias: &str, max_dumps: u32) -> DbdumpResult<Vec<PathBuf>> {
        if max_dumps == 0 {
            return Ok(Vec::new());
        }

        let files = self.alias_dumps(alias)?;
        let excess = files.len().saturating_sub(max_dumps as usize);
        let mut deleted = Vec::with_capacity(excess);

        for path in files.into_iter().take(excess) {
            fs::remove_file(&path).map_err(|e| {
                DbdumpError::Io(format!(
                    "Failed to delete old dump {}: {}",
                    path.display(),
                    e
                ))
            })?;
            info!(alias = %alias, path = %path.display(), "pruned dump");
            deleted.push(path);
        }

        Ok(deleted)
    }

    /// List dumps of an alias with size information, oldest first
    pub fn list(&self, alias: &str, compress_extension: &str) -> DbdumpResult<Vec<DumpInfo>> {
        let mut dumps = Vec::new();

        for path in self.alias_dumps(alias)? {
            let metadata = fs::metadata(&path).map_err(|e| {
                DbdumpError::Io(format!("Failed to stat {}: {}", path.display(), e))
            })?;
            if !metadata.is_file() {
                continue;
            }

            let filename = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let compressed =
                !compress_extension.is_empty() && filename.ends_with(compress_extension);

            dumps.push(DumpInfo {
                alias: alias.to_string(),
                filename,
                path,
                size_bytes: metadata.len(),
                compressed,
            });
        }

        Ok(dumps)
    }
}

/// Retention count for an alias
///
/// A non-zero CLI override wins, then the alias's `max_dumps` option, then
/// the global `max_dumps_per_alias`. Zero disables pruning.
pub fn effective_max_dumps(settings: &Settings, alias: &str, cli_override: Option<u32>) -> u32 {
    match cli_override {
        Some(n) if n > 0 => n,
        _ => settings
            .dump_options
            .get(alias)
            .and_then(|o| o.max_dumps)
            .unwrap_or(settings.max_dumps_per_alias),
    }
}
