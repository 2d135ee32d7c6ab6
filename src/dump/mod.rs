//! Dump creation for dbdump
//!
//! A [`DumpJob`] describes one alias's dump for this run: connection
//! attributes, options and the deterministic output filename. A [`Dumper`]
//! runs the backend's dump command and the configured compressor for it.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdump::dump::{DumpJob, Dumper};
//! use dbdump::process::SystemRunner;
//!
//! let job = DumpJob::prepare("default", &settings, kind, chrono::Utc::now())?;
//! let dumper = Dumper::new(kind, &settings.compression, &SystemRunner);
//! let path = dumper.execute(&job)?;
//! ```

mod converter;
mod job;

pub use converter::Dumper;
pub use job::{
    alias_of, alias_prefix, dump_filename, format_timestamp, mask_connection_string, DumpJob,
    ALIAS_SEPARATOR, REDACTED,
};
