//! rsync command construction

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RsyncSettings;
use crate::error::{DbdumpError, DbdumpResult};
use crate::process::quote;
use crate::template;

/// Which way dumps travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local dump directory to the remote destination
    Push,
    /// Remote destination back into the local dump directory's parent
    Pull,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Push => f.write_str("push"),
            SyncDirection::Pull => f.write_str("pull"),
        }
    }
}

/// Build the rsync command line
///
/// `--delete` is appended only when pushing. `--log-file` is appended when a
/// log path is given.
pub fn build_command(
    rsync: &RsyncSettings,
    dump_dir: &Path,
    direction: SyncDirection,
    log: Option<&Path>,
) -> DbdumpResult<String> {
    let destination = rsync.destination.trim();
    if destination.is_empty() {
        return Err(DbdumpError::Config(
            "Set rsync.destination in the config file".into(),
        ));
    }

    let mut command = match direction {
        SyncDirection::Push => {
            let source = strip_trailing_separators(dump_dir);
            let mut cmd = template::render(
                &rsync.pattern,
                &[("source", &quote(&source)), ("destination", destination)],
            )?;
            if rsync.delete {
                cmd.push_str(" --delete");
            }
            cmd
        }
        SyncDirection::Pull => {
            let target = absolute_parent(dump_dir)?;
            let target = target.to_string_lossy();
            template::render(
                &rsync.pattern,
                &[("source", destination), ("destination", &quote(&target))],
            )?
        }
    };

    if let Some(log) = log {
        command.push_str(&format!(" --log-file={}", quote(&log.to_string_lossy())));
    }

    Ok(command)
}

fn strip_trailing_separators(path: &Path) -> String {
    let text = path.to_string_lossy();
    let trimmed = text.trim_end_matches(std::path::MAIN_SEPARATOR);
    if trimmed.is_empty() {
        text.into_owned()
    } else {
        trimmed.to_string()
    }
}

fn absolute_parent(dump_dir: &Path) -> DbdumpResult<PathBuf> {
    let absolute = if dump_dir.is_absolute() {
        dump_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dump_dir)
    };

    absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            DbdumpError::Config(format!(
                "Dump directory {} has no parent to restore into",
                absolute.display()
            ))
        })
}
