//! rsync execution

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::command::{build_command, SyncDirection};
use super::handshake::{Handshake, HandshakeFailure, HandshakeState};
use super::session::{PtySession, SessionEvent, SyncSession};
use crate::config::RsyncSettings;
use crate::error::{DbdumpError, DbdumpResult};

/// Poll interval while draining output after the handshake
const DRAIN_POLL: Duration = Duration::from_millis(500);

/// Runs rsync between the dump directory and the configured destination
pub struct SyncRunner<'a> {
    rsync: &'a RsyncSettings,
    dump_dir: &'a Path,
}

impl<'a> SyncRunner<'a> {
    pub fn new(rsync: &'a RsyncSettings, dump_dir: &'a Path) -> Self {
        Self { rsync, dump_dir }
    }

    /// The command line for a direction
    pub fn build_command(&self, direction: SyncDirection, log: Option<&Path>) -> DbdumpResult<String> {
        build_command(self.rsync, self.dump_dir, direction, log)
    }

    /// Run rsync and return its exit code
    pub fn run(&self, direction: SyncDirection, log: Option<&Path>) -> DbdumpResult<i32> {
        let command = self.build_command(direction, log)?;
        info!(direction = %direction, "starting rsync");
        debug!(command = %command, "rsync command");

        let mut session = PtySession::spawn(&command)?;
        drive(
            &mut session,
            self.rsync.password(),
            self.rsync.timeout(),
            &command,
        )
    }
}

/// Run the password handshake (when a password is set), drain the remaining
/// output and return the exit code
///
/// Without a password no prompt is waited for, so no timeout can fire.
pub fn drive(
    session: &mut dyn SyncSession,
    password: Option<&str>,
    timeout: Duration,
    command: &str,
) -> DbdumpResult<i32> {
    if let Some(password) = password {
        let mut handshake = Handshake::new(password);

        while !handshake.is_finished() {
            match session.read(timeout)? {
                SessionEvent::Output(chunk) => {
                    if let Some(reply) = handshake.on_output(&chunk) {
                        session.send_line(&reply)?;
                    }
                }
                SessionEvent::Timeout => handshake.on_timeout(),
                SessionEvent::Closed => {
                    debug!(state = ?handshake.state(), "process closed during handshake");
                    break;
                }
            }
        }

        match handshake.state() {
            HandshakeState::Failed(HandshakeFailure::Timeout) => {
                warn!(command = %command, "no prompt from rsync before timeout");
                return Err(DbdumpError::SyncTimeout {
                    command: command.to_string(),
                });
            }
            HandshakeState::Failed(HandshakeFailure::AuthFailed) => {
                return Err(DbdumpError::SyncAuthFailed);
            }
            _ => {}
        }
    }

    loop {
        match session.read(DRAIN_POLL)? {
            SessionEvent::Closed => break,
            SessionEvent::Output(_) | SessionEvent::Timeout => {}
        }
    }

    session.wait()
}

/// Map a non-zero rsync exit code to an error
pub fn ensure_success(code: i32) -> DbdumpResult<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(DbdumpError::SyncFailed { code })
    }
}

/// Temporary rsync log file, removed when dropped
#[derive(Debug)]
pub struct SyncLog {
    path: PathBuf,
}

impl SyncLog {
    /// Allocate `<tmp>/<uuid>.log`; the file itself is created by rsync
    pub fn new() -> Self {
        Self::in_dir(&std::env::temp_dir())
    }

    pub fn in_dir(dir: &Path) -> Self {
        let path = dir.join(format!("{}.log", Uuid::new_v4().simple()));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Log contents, empty if rsync never wrote it
    pub fn contents(&self) -> String {
        fs::read_to_string(&self.path).unwrap_or_default()
    }
}

impl Default for SyncLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SyncLog {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove rsync log");
            }
        }
    }
}
