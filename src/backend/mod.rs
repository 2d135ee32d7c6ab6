//! Database backends
//!
//! A backend knows how to turn a [`DumpJob`] into a vendor dump command, what
//! extension the dump file carries, and how to print the statements that
//! recreate the database.
//!
//! # Dispatch
//!
//! Engine identifier strings (as found in the `databases` config table) are
//! mapped to a [`BackendKind`] through a [`BackendRegistry`]. The registry
//! starts from the built-in table and takes user overrides from the
//! `backends` config table; overrides win on collision. New engine strings
//! are added with [`BackendRegistry::register`].
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdump::backend::{BackendKind, BackendRegistry};
//!
//! let mut registry = BackendRegistry::with_defaults();
//! registry.register("django.contrib.gis.db.backends.postgis", BackendKind::Postgresql);
//! let kind = registry.resolve("django.db.backends.postgresql")?;
//! println!("{}", kind.converter().build_command(&job)?);
//! ```

mod postgres;
mod registry;

use std::fmt;
use std::str::FromStr;

use crate::dump::DumpJob;
use crate::error::DbdumpResult;

pub use postgres::PostgresConverter;
pub use registry::BackendRegistry;

/// Builds vendor-specific commands for a dump job
pub trait DumpConverter {
    /// Extension of the uncompressed dump file, including the dot
    fn extension(&self) -> &'static str;

    /// Full dump command line for the job
    fn build_command(&self, job: &DumpJob) -> DbdumpResult<String>;

    /// Statements that create the database and its owner
    fn create_sql(&self, job: &DumpJob) -> String;
}

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Postgresql,
}

impl BackendKind {
    /// The converter implementing this backend
    pub fn converter(&self) -> &'static dyn DumpConverter {
        match self {
            BackendKind::Postgresql => &PostgresConverter,
        }
    }

    /// Canonical name, as accepted in the `backends` config table
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "psycopg2" => Ok(BackendKind::Postgresql),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}
