//! Blocking subprocess execution
//!
//! Commands are split with shell-word rules and executed directly, without a
//! shell. The [`CommandRunner`] trait is the seam the dump converter runs
//! through, so tests can substitute a recording fake.

use std::borrow::Cow;
use std::process::Command;

use tracing::debug;

use crate::error::{DbdumpError, DbdumpResult};

/// Runs a command line and reports its exit code
pub trait CommandRunner {
    fn run(&self, command_line: &str) -> DbdumpResult<i32>;
}

/// Runs commands as real child processes, inheriting stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command_line: &str) -> DbdumpResult<i32> {
        let args = split_command(command_line)?;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| DbdumpError::spawn(command_line, "empty command"))?;

        debug!(program = %program, argc = rest.len(), "spawning process");

        let status = Command::new(program)
            .args(rest)
            .status()
            .map_err(|e| DbdumpError::spawn(command_line, e))?;

        // A signal-terminated child has no code
        Ok(status.code().unwrap_or(-1))
    }
}

/// Split a command line into arguments using POSIX shell quoting rules
pub fn split_command(command_line: &str) -> DbdumpResult<Vec<String>> {
    shlex::split(command_line)
        .ok_or_else(|| DbdumpError::spawn(command_line, "unbalanced quotes"))
}

/// Quote a value so it survives [`split_command`] as a single argument
pub fn quote(value: &str) -> Cow<'_, str> {
    shlex::try_quote(value).unwrap_or(Cow::Borrowed(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_respects_quotes() {
        let args = split_command("sh -c 'mv \"$0\" \"$0.gz\"' /tmp/a b").unwrap();
        assert_eq!(args, vec!["sh", "-c", "mv \"$0\" \"$0.gz\"", "/tmp/a", "b"]);
    }

    #[test]
    fn test_split_command_unbalanced_quotes() {
        let err = split_command("gzip 'oops").unwrap_err();
        assert!(matches!(err, DbdumpError::Spawn { .. }));
    }

    #[test]
    fn test_quote_round_trips_through_split() {
        let path = "/tmp/my dumps/default__2024.tar";
        let line = format!("gzip {}", quote(path));
        assert_eq!(split_command(&line).unwrap(), vec!["gzip", path]);
    }

    #[test]
    fn test_quote_leaves_plain_paths_alone() {
        assert_eq!(quote("/var/dumps/a.tar"), "/var/dumps/a.tar");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code() {
        assert_eq!(SystemRunner.run("true").unwrap(), 0);
        assert_eq!(SystemRunner.run("sh -c 'exit 3'").unwrap(), 3);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run("/nonexistent/definitely-not-a-binary --flag")
            .unwrap_err();
        assert!(matches!(err, DbdumpError::Spawn { .. }));
    }

    #[test]
    fn test_system_runner_empty_command() {
        assert!(SystemRunner.run("   ").is_err());
    }
}
