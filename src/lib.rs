//! dbdump - database dump orchestration
//!
//! This library provides the core functionality of the `dbdump` tool: it
//! dumps configured databases with their vendor tool, compresses the dumps,
//! keeps the newest N per alias and mirrors the dump directory off-site with
//! rsync.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration file resolution, settings and validation
//! - `error`: Custom error types
//! - `backend`: Engine identifier lookup and vendor command builders
//! - `dump`: Dump jobs, filenames, dump and compress execution
//! - `retention`: Pruning old dumps per alias
//! - `sync`: rsync command building, password handshake, pty sessions
//! - `process`: Blocking subprocess execution
//! - `cli`: Command handlers behind the binary
//!
//! Everything runs sequentially: each alias is dumped, compressed and pruned
//! before the next, and sync runs once at the end. Nothing locks the dump
//! directory, so two concurrent runs against the same directory can prune
//! each other's files.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdump::cli::{handle_dump_command, DumpArgs};
//! use dbdump::config::{DbdumpPaths, Settings};
//! use dbdump::process::SystemRunner;
//!
//! let paths = DbdumpPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! settings.validate()?;
//! let summary = handle_dump_command(&settings, &DumpArgs::default(), &SystemRunner, &mut std::io::stdout())?;
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod logging;
pub mod process;
pub mod retention;
pub mod sync;
pub mod template;

pub use error::{DbdumpError, DbdumpResult};
