//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the dump, retention and sync
//! components.

pub mod dump;
pub mod list;

pub use dump::{handle_dump_command, resolve_backends, selected_aliases, DumpArgs, RunSummary};
pub use list::handle_list_command;
