//! Retention for dbdump
//!
//! Keeps the newest N dumps per alias and deletes the rest.
//!
//! # Retention Policy
//!
//! The count comes from, in order: a non-zero `--max-dumps`, the alias's
//! `max_dumps` dump option, the global `max_dumps_per_alias` (default 10).
//! Zero keeps every dump.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdump::retention::{effective_max_dumps, RetentionPruner};
//!
//! let pruner = RetentionPruner::new(&settings.dump_dir);
//! let deleted = pruner.prune("default", effective_max_dumps(&settings, "default", None))?;
//! ```

mod pruner;

pub use pruner::{effective_max_dumps, DumpInfo, RetentionPruner};
