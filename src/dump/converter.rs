//! Dump and compress execution

use std::path::PathBuf;

use tracing::{debug, info};

use super::DumpJob;
use crate::backend::{BackendKind, DumpConverter};
use crate::config::CompressionSettings;
use crate::error::{DbdumpError, DbdumpResult};
use crate::process::{quote, CommandRunner};
use crate::template;

/// Runs the dump and compression commands for jobs of one backend
pub struct Dumper<'a> {
    converter: &'static dyn DumpConverter,
    compression: &'a CompressionSettings,
    runner: &'a dyn CommandRunner,
}

impl<'a> Dumper<'a> {
    pub fn new(
        kind: BackendKind,
        compression: &'a CompressionSettings,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            converter: kind.converter(),
            compression,
            runner,
        }
    }

    /// The dump command line for a job
    pub fn build_command(&self, job: &DumpJob) -> DbdumpResult<String> {
        self.converter.build_command(job)
    }

    /// The compression command line for a job, `None` when compression is off
    pub fn build_compress_command(&self, job: &DumpJob) -> DbdumpResult<Option<String>> {
        if !self.compression.is_active() {
            return Ok(None);
        }
        let path = job.filepath.to_string_lossy();
        template::render(&self.compression.command, &[("path", &quote(&path))]).map(Some)
    }

    /// The dump command line with secrets masked
    pub fn build_display_command(&self, job: &DumpJob) -> DbdumpResult<String> {
        self.converter.build_command(&job.redacted())
    }

    /// Run the dump command
    pub fn execute_dump(&self, job: &DumpJob) -> DbdumpResult<()> {
        let command = self.build_command(job)?;
        let display_command = self.build_display_command(job)?;
        debug!(alias = %job.alias, command = %display_command, "running dump");

        let code = self.runner.run(&command)?;
        if code != 0 {
            return Err(DbdumpError::DumpCommandFailed {
                command: display_command,
                code,
            });
        }
        Ok(())
    }

    /// Compress the dump file, returning the compressed path
    ///
    /// Returns `None` without running anything when compression is disabled.
    pub fn compress(&self, job: &DumpJob) -> DbdumpResult<Option<PathBuf>> {
        let Some(command) = self.build_compress_command(job)? else {
            return Ok(None);
        };
        debug!(alias = %job.alias, command = %command, "compressing dump");

        let code = self.runner.run(&command)?;
        if code != 0 {
            return Err(DbdumpError::CompressCommandFailed { command, code });
        }
        Ok(Some(job.compressed_filepath(&self.compression.extension)))
    }

    /// Dump then compress; returns the path of the final file
    pub fn execute(&self, job: &DumpJob) -> DbdumpResult<PathBuf> {
        self.execute_dump(job)?;
        let path = self
            .compress(job)?
            .unwrap_or_else(|| job.filepath.clone());
        info!(alias = %job.alias, path = %path.display(), "dump complete");
        Ok(path)
    }

    /// Statements that create the job's database
    pub fn create_sql(&self, job: &DumpJob) -> String {
        self.converter.create_sql(job)
    }
}
