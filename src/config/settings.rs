//! User settings for dbdump
//!
//! Holds the database connections, per-alias dump options, compression,
//! retention and rsync preferences. Loaded once at startup, validated, and
//! passed explicitly to each component.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use super::paths::DbdumpPaths;
use crate::backend::BackendKind;
use crate::error::DbdumpError;

/// Connection attributes for one database alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Engine identifier, e.g. `django.db.backends.postgresql`
    pub engine: String,
    /// Database name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    /// Port, accepted as a string or a number; empty means the backend default
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: String,
}

/// Per-alias overrides for the dump step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpOptions {
    /// Full connection string, used verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Pattern with `{{username}}`, `{{password}}`, `{{host}}`, `{{port}}`, `{{database}}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string_pattern: Option<String>,
    /// Extra arguments appended to the dump command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Dump executable, replacing the backend default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Retention override for this alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dumps: Option<u32>,
    /// Timestamp format override for this alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strftime_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

/// Compression settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Command template, `{{path}}` is the dump file
    #[serde(default = "default_compress_command")]
    pub command: String,
    #[serde(default = "default_decompress_command")]
    pub decompress_command: String,
    /// Suffix the compressor adds to the dump file
    #[serde(default = "default_compress_extension")]
    pub extension: String,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: default_compress_command(),
            decompress_command: default_decompress_command(),
            extension: default_compress_extension(),
        }
    }
}

impl CompressionSettings {
    /// Compression runs only when enabled and a command is set
    pub fn is_active(&self) -> bool {
        self.enabled && !self.command.trim().is_empty()
    }
}

/// rsync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsyncSettings {
    /// Run a push sync after dumping
    #[serde(default)]
    pub enabled: bool,
    /// Command template with `{{source}}` and `{{destination}}`
    #[serde(default = "default_rsync_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub password: String,
    /// Remove destination files missing from the source (push only)
    #[serde(default = "default_true")]
    pub delete: bool,
    /// Seconds to wait for each prompt during the password handshake
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RsyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            pattern: default_rsync_pattern(),
            destination: String::new(),
            password: String::new(),
            delete: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RsyncSettings {
    /// The configured password, if any
    pub fn password(&self) -> Option<&str> {
        if self.password.is_empty() {
            None
        } else {
            Some(&self.password)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// User settings for dbdump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding dump files; defaults to `<config dir>/dumps`
    #[serde(default)]
    pub dump_dir: PathBuf,

    /// Default timestamp format for dump filenames
    #[serde(default = "default_strftime_format")]
    pub strftime_format: String,

    /// Dumps kept per alias; 0 keeps everything
    #[serde(default = "default_max_dumps")]
    pub max_dumps_per_alias: u32,

    /// Parallelism hint, reported only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Database connections keyed by alias
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseConfig>,

    /// Per-alias dump overrides
    #[serde(default)]
    pub dump_options: BTreeMap<String, DumpOptions>,

    /// Engine identifier to backend name overrides
    #[serde(default)]
    pub backends: BTreeMap<String, String>,

    #[serde(default)]
    pub compression: CompressionSettings,

    #[serde(default)]
    pub rsync: RsyncSettings,
}

fn default_true() -> bool {
    true
}

fn default_strftime_format() -> String {
    "%Y-%m-%d-%H%M%S".to_string()
}

fn default_max_dumps() -> u32 {
    10
}

fn default_compress_command() -> String {
    "gzip -f -9 {{path}}".to_string()
}

fn default_decompress_command() -> String {
    "gzip -d {{path}}".to_string()
}

fn default_compress_extension() -> String {
    ".gz".to_string()
}

fn default_rsync_pattern() -> String {
    "rsync -raz --progress {{source}} {{destination}}".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::new(),
            strftime_format: default_strftime_format(),
            max_dumps_per_alias: default_max_dumps(),
            concurrency: None,
            databases: BTreeMap::new(),
            dump_options: BTreeMap::new(),
            backends: BTreeMap::new(),
            compression: CompressionSettings::default(),
            rsync: RsyncSettings::default(),
        }
    }
}

/// Serialization format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

impl Settings {
    /// Settings written by `dbdump init`: defaults plus one sample alias
    pub fn example(paths: &DbdumpPaths) -> Self {
        let mut settings = Settings {
            dump_dir: paths.default_dump_dir(),
            ..Settings::default()
        };
        settings.databases.insert(
            "default".to_string(),
            DatabaseConfig {
                engine: "django.db.backends.postgresql".to_string(),
                name: "app".to_string(),
                user: "app".to_string(),
                password: String::new(),
                host: "localhost".to_string(),
                port: "5432".to_string(),
            },
        );
        settings.rsync.destination = "backup@example.com:/backups/".to_string();
        settings
    }

    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &DbdumpPaths) -> Result<Self, DbdumpError> {
        let settings_path = paths.config_file();

        let mut settings = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                DbdumpError::Io(format!(
                    "Failed to read config file {}: {}",
                    settings_path.display(),
                    e
                ))
            })?;

            Self::parse(&contents, Format::of(&settings_path)).map_err(|e| {
                DbdumpError::Config(format!(
                    "Failed to parse config file {}: {}",
                    settings_path.display(),
                    e
                ))
            })?
        } else {
            Settings::default()
        };

        if settings.dump_dir.as_os_str().is_empty() {
            settings.dump_dir = paths.default_dump_dir();
        }

        Ok(settings)
    }

    fn parse(contents: &str, format: Format) -> Result<Self, DbdumpError> {
        match format {
            Format::Json => Ok(serde_json::from_str(contents)?),
            Format::Yaml => Ok(serde_yaml::from_str(contents)?),
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &DbdumpPaths) -> Result<(), DbdumpError> {
        let settings_path = paths.config_file();
        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbdumpError::Io(format!("Failed to create config directory: {}", e))
            })?;
        }

        let contents = match Format::of(&settings_path) {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?,
        };

        std::fs::write(&settings_path, contents)
            .map_err(|e| DbdumpError::Io(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Check required fields and prepare the dump directory
    ///
    /// Creates the dump directory (mode 0755 on Unix) when it is missing.
    pub fn validate(&self) -> Result<(), DbdumpError> {
        for (alias, db) in &self.databases {
            if db.engine.trim().is_empty() {
                return Err(DbdumpError::Config(format!(
                    "Database `{}` has no engine",
                    alias
                )));
            }
            if db.name.trim().is_empty() {
                return Err(DbdumpError::Config(format!(
                    "Database `{}` has no name",
                    alias
                )));
            }
        }

        for (engine, backend) in &self.backends {
            backend.parse::<BackendKind>().map_err(|_| {
                DbdumpError::Config(format!(
                    "Unknown backend `{}` configured for engine `{}`",
                    backend, engine
                ))
            })?;
        }

        self.ensure_dump_dir()
    }

    fn ensure_dump_dir(&self) -> Result<(), DbdumpError> {
        if self.dump_dir.is_dir() {
            return Ok(());
        }

        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }

        builder.create(&self.dump_dir).map_err(|e| {
            DbdumpError::Config(format!(
                "Cannot create dump directory {}: {}",
                self.dump_dir.display(),
                e
            ))
        })
    }

    /// Dump options for an alias, empty when none are configured
    pub fn dump_options(&self, alias: &str) -> DumpOptions {
        self.dump_options.get(alias).cloned().unwrap_or_default()
    }

    /// Parallelism hint for an alias, falling back to the global one
    pub fn alias_concurrency(&self, alias: &str) -> usize {
        self.dump_options
            .get(alias)
            .and_then(|o| o.concurrency)
            .unwrap_or_else(|| self.concurrency())
    }

    /// Effective parallelism hint
    pub fn concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.strftime_format, "%Y-%m-%d-%H%M%S");
        assert_eq!(settings.max_dumps_per_alias, 10);
        assert!(settings.compression.is_active());
        assert_eq!(settings.compression.extension, ".gz");
        assert!(!settings.rsync.enabled);
        assert!(settings.rsync.delete);
        assert!(settings.rsync.password().is_none());
    }

    #[test]
    fn test_missing_file_uses_default_dump_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DbdumpPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings.dump_dir, temp_dir.path().join("dumps"));
    }

    #[test]
    fn test_save_and_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DbdumpPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::example(&paths);
        settings.max_dumps_per_alias = 3;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.max_dumps_per_alias, 3);
        assert_eq!(loaded.databases["default"].name, "app");
    }

    #[test]
    fn test_load_yaml_with_numeric_port() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("dbdump.yaml");
        std::fs::write(
            &config,
            "dump_dir: /tmp/dumps\n\
             databases:\n  \
               default:\n    \
                 engine: django.db.backends.postgresql\n    \
                 name: db\n    \
                 port: 6543\n\
             rsync:\n  \
               password: hunter2\n",
        )
        .unwrap();

        let paths =
            DbdumpPaths::with_base_dir(temp_dir.path().to_path_buf()).with_config_file(&config);
        let settings = Settings::load_or_create(&paths).unwrap();

        assert_eq!(settings.dump_dir, PathBuf::from("/tmp/dumps"));
        assert_eq!(settings.databases["default"].port, "6543");
        assert_eq!(settings.rsync.password(), Some("hunter2"));
        assert_eq!(settings.rsync.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DbdumpPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.config_file(), "{ not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, DbdumpError::Config(_)));
    }

    #[test]
    fn test_validate_creates_dump_dir() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings {
            dump_dir: temp_dir.path().join("a").join("b"),
            ..Settings::default()
        };

        settings.validate().unwrap();
        assert!(settings.dump_dir.is_dir());
    }

    #[test]
    fn test_validate_rejects_missing_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings {
            dump_dir: temp_dir.path().to_path_buf(),
            ..Settings::default()
        };
        settings.databases.insert(
            "default".into(),
            DatabaseConfig {
                engine: "postgresql".into(),
                ..DatabaseConfig::default()
            },
        );

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("has no name"));
    }

    #[test]
    fn test_validate_rejects_unknown_backend_override() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings {
            dump_dir: temp_dir.path().to_path_buf(),
            ..Settings::default()
        };
        settings
            .backends
            .insert("django.db.backends.mysql".into(), "mysql".into());

        assert!(matches!(
            settings.validate(),
            Err(DbdumpError::Config(_))
        ));
    }

    #[test]
    fn test_alias_concurrency_falls_back_to_global() {
        let mut settings = Settings {
            concurrency: Some(4),
            ..Settings::default()
        };
        settings.dump_options.insert(
            "reports".into(),
            DumpOptions {
                concurrency: Some(1),
                ..DumpOptions::default()
            },
        );

        assert_eq!(settings.alias_concurrency("reports"), 1);
        assert_eq!(settings.alias_concurrency("default"), 4);
    }

    #[test]
    fn test_dump_options_default_when_absent() {
        let settings = Settings::default();
        assert_eq!(settings.dump_options("missing"), DumpOptions::default());
    }
}
