//! List CLI command
//!
//! Shows the dumps kept for each alias, oldest first.

use std::io::Write;

use crate::config::Settings;
use crate::error::DbdumpResult;
use crate::retention::{effective_max_dumps, RetentionPruner};

use super::dump::selected_aliases;

/// Handle `dbdump list`
pub fn handle_list_command<W: Write>(
    settings: &Settings,
    aliases: &[String],
    out: &mut W,
) -> DbdumpResult<usize> {
    let pruner = RetentionPruner::new(&settings.dump_dir);
    let mut total = 0;

    writeln!(out, "Dumps in {}", settings.dump_dir.display())?;
    writeln!(out)?;

    for alias in selected_aliases(settings, aliases) {
        let dumps = pruner.list(&alias, &settings.compression.extension)?;
        let keep = effective_max_dumps(settings, &alias, None);
        let keep = if keep == 0 {
            "all".to_string()
        } else {
            keep.to_string()
        };

        writeln!(out, "{} ({} dump(s), keeping {})", alias, dumps.len(), keep)?;
        if dumps.is_empty() {
            writeln!(out, "  No dumps found.")?;
        }
        for dump in &dumps {
            writeln!(
                out,
                "  {}  {:>10}{}",
                dump.filename,
                format_size(dump.size_bytes),
                if dump.compressed { "" } else { "  [uncompressed]" }
            )?;
        }
        writeln!(out)?;
        total += dumps.len();
    }

    writeln!(out, "Total: {} dump(s)", total)?;
    Ok(total)
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
