//! Dump CLI command
//!
//! Dumps, compresses and prunes each selected alias in turn, then optionally
//! pushes the dump directory with rsync. The informational flags short-circuit
//! in this order: `--show-dump-cmd`, `--create`, `--load`, `--rsync-restore`,
//! `--start-rsync`.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use tracing::{error, warn};

use crate::backend::{BackendKind, BackendRegistry};
use crate::config::Settings;
use crate::dump::{DumpJob, Dumper};
use crate::error::DbdumpResult;
use crate::process::CommandRunner;
use crate::retention::{effective_max_dumps, RetentionPruner};
use crate::sync::{ensure_success, SyncDirection, SyncLog, SyncRunner};

/// Arguments of `dbdump dump`
#[derive(Args, Debug, Default, Clone)]
pub struct DumpArgs {
    /// Database aliases to dump (default: all configured)
    pub aliases: Vec<String>,

    /// Print the dump command instead of running it
    #[arg(long)]
    pub show_dump_cmd: bool,

    /// Print CREATE statements for the databases
    #[arg(long)]
    pub create: bool,

    /// Load the database from the last dump (not implemented, does nothing)
    #[arg(long)]
    pub load: bool,

    /// Push dumps with rsync and exit
    #[arg(long)]
    pub start_rsync: bool,

    /// Pull dumps back with rsync and exit
    #[arg(long)]
    pub rsync_restore: bool,

    /// Max dumps kept per alias for this run
    #[arg(long, value_name = "N")]
    pub max_dumps: Option<u32>,

    /// Run rsync after dumping
    #[arg(long, overrides_with = "no_rsync")]
    pub rsync: bool,

    /// Do NOT run rsync after dumping
    #[arg(long, overrides_with = "rsync")]
    pub no_rsync: bool,
}

impl DumpArgs {
    /// Explicit `--rsync`/`--no-rsync` choice, if any
    pub fn rsync_override(&self) -> Option<bool> {
        if self.rsync {
            Some(true)
        } else if self.no_rsync {
            Some(false)
        } else {
            None
        }
    }
}

/// Outcome of a dump run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Final paths of successful dumps
    pub dumped: Vec<PathBuf>,
    /// Aliases whose dump, compression or pruning failed
    pub failed: Vec<String>,
    /// Dumps deleted by retention
    pub pruned: Vec<PathBuf>,
    /// Sync error message, if a sync ran and failed
    pub sync_error: Option<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.sync_error.is_none()
    }
}

/// Configured aliases matching the request, in configuration order
///
/// An empty request selects every alias. Unknown names are skipped with a
/// warning.
pub fn selected_aliases(settings: &Settings, requested: &[String]) -> Vec<String> {
    for alias in requested {
        if !settings.databases.contains_key(alias) {
            warn!(alias = %alias, "alias is not configured, skipping");
        }
    }

    settings
        .databases
        .keys()
        .filter(|alias| requested.is_empty() || requested.contains(*alias))
        .cloned()
        .collect()
}

/// Resolve the backend of every alias before any of them is touched
///
/// One unknown engine fails the whole selection, so a run never stops
/// halfway with some aliases dumped and the sync skipped.
pub fn resolve_backends(
    registry: &BackendRegistry,
    settings: &Settings,
    aliases: &[String],
) -> DbdumpResult<Vec<(String, BackendKind)>> {
    aliases
        .iter()
        .map(|alias| {
            registry
                .resolve(&settings.databases[alias].engine)
                .map(|kind| (alias.clone(), kind))
        })
        .collect()
}

/// Handle `dbdump dump`
pub fn handle_dump_command<W: Write>(
    settings: &Settings,
    args: &DumpArgs,
    runner: &dyn CommandRunner,
    out: &mut W,
) -> DbdumpResult<RunSummary> {
    let registry = BackendRegistry::from_settings(settings)?;
    let aliases = selected_aliases(settings, &args.aliases);
    let mut summary = RunSummary::default();

    if args.show_dump_cmd {
        for (alias, kind) in resolve_backends(&registry, settings, &aliases)? {
            let job = DumpJob::prepare(&alias, settings, kind, Utc::now())?;
            let dumper = Dumper::new(kind, &settings.compression, runner);
            writeln!(out, "{}", dumper.build_command(&job)?)?;
        }
        return Ok(summary);
    }

    if args.create {
        for (alias, kind) in resolve_backends(&registry, settings, &aliases)? {
            let job = DumpJob::prepare(&alias, settings, kind, Utc::now())?;
            let dumper = Dumper::new(kind, &settings.compression, runner);
            writeln!(out, "Create script for `{}`", alias)?;
            writeln!(out, "{}", dumper.create_sql(&job))?;
        }
        return Ok(summary);
    }

    if args.load {
        warn!("--load is accepted but restoring dumps is not implemented; nothing to do");
        return Ok(summary);
    }

    if args.rsync_restore {
        summary.sync_error = run_sync(settings, SyncDirection::Pull, out)?;
        return Ok(summary);
    }

    if args.start_rsync {
        summary.sync_error = run_sync(settings, SyncDirection::Push, out)?;
        return Ok(summary);
    }

    let backends = resolve_backends(&registry, settings, &aliases)?;
    let pruner = RetentionPruner::new(&settings.dump_dir);

    for (alias, kind) in &backends {
        let dumper = Dumper::new(*kind, &settings.compression, runner);

        write!(out, "Dumping `{}` -> ", alias)?;
        out.flush()?;

        let result = DumpJob::prepare(alias, settings, *kind, Utc::now())
            .and_then(|job| dumper.execute(&job));

        match result {
            Ok(path) => {
                writeln!(out, "[OK]")?;
                summary.dumped.push(path);
            }
            Err(e) => {
                writeln!(out, "[Failed]")?;
                writeln!(out, "  {}", e)?;
                error!(alias = %alias, error = %e, "dump failed, skipping retention");
                summary.failed.push(alias.clone());
                continue;
            }
        }

        let max_dumps = effective_max_dumps(settings, alias, args.max_dumps);
        match pruner.prune(alias, max_dumps) {
            Ok(deleted) => summary.pruned.extend(deleted),
            Err(e) => {
                writeln!(out, "  Pruning `{}` failed: {}", alias, e)?;
                error!(alias = %alias, error = %e, "pruning failed");
                summary.failed.push(alias.clone());
            }
        }
    }

    if args.rsync_override().unwrap_or(settings.rsync.enabled) {
        summary.sync_error = run_sync(settings, SyncDirection::Push, out)?;
    }

    Ok(summary)
}

/// Run one sync, reporting inline and echoing the rsync log
///
/// Returns `Ok(Some(message))` when the sync itself failed; configuration
/// errors are returned as `Err` before anything is spawned.
fn run_sync<W: Write>(
    settings: &Settings,
    direction: SyncDirection,
    out: &mut W,
) -> DbdumpResult<Option<String>> {
    let runner = SyncRunner::new(&settings.rsync, &settings.dump_dir);
    runner.build_command(direction, None)?;

    write!(out, "Starting rsync -> ")?;
    out.flush()?;

    let log = SyncLog::new();
    let result = runner.run(direction, Some(log.path()));

    let outcome = match result {
        Ok(0) => {
            writeln!(out, "[OK]")?;
            None
        }
        Ok(code) => {
            writeln!(out, "[Return code: {}]", code)?;
            ensure_success(code).err().map(|e| e.to_string())
        }
        Err(e) => {
            writeln!(out, "ERROR[{}]", e)?;
            error!(direction = %direction, error = %e, "rsync failed");
            Some(e.to_string())
        }
    };

    write!(out, "{}", log.contents())?;
    out.flush()?;

    Ok(outcome)
}
