//! Engine identifier to backend lookup

use std::collections::HashMap;

use tracing::debug;

use super::BackendKind;
use crate::config::Settings;
use crate::error::{DbdumpError, DbdumpResult};

/// Built-in engine identifiers
const BUNDLED_BACKENDS: &[(&str, BackendKind)] = &[
    ("django.db.backends.postgresql_psycopg2", BackendKind::Postgresql),
    ("django.db.backends.postgresql", BackendKind::Postgresql),
    ("postgresql", BackendKind::Postgresql),
    ("postgres", BackendKind::Postgresql),
];

/// Maps engine identifiers to backends
#[derive(Debug, Clone)]
pub struct BackendRegistry {
    table: HashMap<String, BackendKind>,
}

impl BackendRegistry {
    /// Registry holding only the built-in engines
    pub fn with_defaults() -> Self {
        let table = BUNDLED_BACKENDS
            .iter()
            .map(|(engine, kind)| (engine.to_string(), *kind))
            .collect();
        Self { table }
    }

    /// Built-in engines plus the `backends` overrides from settings
    pub fn from_settings(settings: &Settings) -> DbdumpResult<Self> {
        let mut registry = Self::with_defaults();
        for (engine, backend) in &settings.backends {
            let kind = backend.parse::<BackendKind>().map_err(|_| {
                DbdumpError::Config(format!(
                    "Unknown backend `{}` configured for engine `{}`",
                    backend, engine
                ))
            })?;
            registry.register(engine.clone(), kind);
        }
        Ok(registry)
    }

    /// Register an engine, replacing any existing mapping
    pub fn register(&mut self, engine: impl Into<String>, kind: BackendKind) {
        let engine = engine.into();
        debug!(engine = %engine, backend = %kind, "registering backend");
        self.table.insert(engine, kind);
    }

    /// Find the backend for an engine identifier
    pub fn resolve(&self, engine: &str) -> DbdumpResult<BackendKind> {
        self.table
            .get(engine)
            .copied()
            .ok_or_else(|| DbdumpError::BackendNotFound(engine.to_string()))
    }

    /// Registered engine identifiers, sorted
    pub fn engines(&self) -> Vec<&str> {
        let mut engines: Vec<&str> = self.table.keys().map(String::as_str).collect();
        engines.sort_unstable();
        engines
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_bundled_engines() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(
            registry.resolve("django.db.backends.postgresql").unwrap(),
            BackendKind::Postgresql
        );
        assert_eq!(
            registry
                .resolve("django.db.backends.postgresql_psycopg2")
                .unwrap(),
            BackendKind::Postgresql
        );
    }

    #[test]
    fn test_unknown_engine_names_identifier() {
        let registry = BackendRegistry::with_defaults();
        let err = registry.resolve("django.db.backends.sqlite3").unwrap_err();
        assert!(matches!(err, DbdumpError::BackendNotFound(ref e) if e == "django.db.backends.sqlite3"));
    }

    #[test]
    fn test_register_extends_table() {
        let mut registry = BackendRegistry::with_defaults();
        registry.register("django.contrib.gis.db.backends.postgis", BackendKind::Postgresql);
        assert!(registry
            .resolve("django.contrib.gis.db.backends.postgis")
            .is_ok());
        assert!(registry
            .engines()
            .contains(&"django.contrib.gis.db.backends.postgis"));
    }

    #[test]
    fn test_settings_overrides_are_applied() {
        let mut settings = Settings::default();
        settings
            .backends
            .insert("custom.engine".into(), "postgres".into());

        let registry = BackendRegistry::from_settings(&settings).unwrap();
        assert_eq!(
            registry.resolve("custom.engine").unwrap(),
            BackendKind::Postgresql
        );
    }

    #[test]
    fn test_settings_with_bad_backend_name() {
        let mut settings = Settings::default();
        settings
            .backends
            .insert("custom.engine".into(), "oracle".into());

        assert!(matches!(
            BackendRegistry::from_settings(&settings),
            Err(DbdumpError::Config(_))
        ));
    }
}
