//! Interactive process sessions
//!
//! [`PtySession`] runs a command under a pseudo-terminal so that prompts
//! written to the controlling terminal (ssh password prompts) can be seen and
//! answered. Output is read on a background thread and handed over through a
//! channel, which lets the caller wait with a timeout.

use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tracing::trace;

use crate::error::{DbdumpError, DbdumpResult};
use crate::process::split_command;

/// What a read from the session produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Output(String),
    /// Nothing arrived within the timeout
    Timeout,
    /// The process closed its terminal
    Closed,
}

/// A running interactive process
pub trait SyncSession {
    /// Wait up to `timeout` for the next chunk of output
    fn read(&mut self, timeout: Duration) -> DbdumpResult<SessionEvent>;

    /// Type a line into the process's terminal
    fn send_line(&mut self, line: &str) -> DbdumpResult<()>;

    /// Wait for the process to exit and return its exit code
    fn wait(&mut self) -> DbdumpResult<i32>;
}

/// A command running under a pseudo-terminal
pub struct PtySession {
    command: String,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: Receiver<String>,
    // Dropping the master hangs up the child's terminal
    _master: Box<dyn MasterPty + Send>,
}

impl PtySession {
    /// Split and spawn `command_line` under a new pseudo-terminal
    pub fn spawn(command_line: &str) -> DbdumpResult<Self> {
        let args = split_command(command_line)?;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| DbdumpError::spawn(command_line, "empty command"))?;

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 200,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| DbdumpError::spawn(command_line, e))?;

        let mut builder = CommandBuilder::new(program);
        builder.args(rest);
        builder.cwd(std::env::current_dir()?);

        let child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| DbdumpError::spawn(command_line, e))?;
        // The reader only sees EOF once no slave handle is left open here
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| DbdumpError::spawn(command_line, e))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| DbdumpError::spawn(command_line, e))?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                        if tx.send(chunk).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            command: command_line.to_string(),
            child,
            writer,
            output: rx,
            _master: pair.master,
        })
    }
}

impl SyncSession for PtySession {
    fn read(&mut self, timeout: Duration) -> DbdumpResult<SessionEvent> {
        match self.output.recv_timeout(timeout) {
            Ok(chunk) => {
                trace!(output = %chunk, "session output");
                Ok(SessionEvent::Output(chunk))
            }
            Err(RecvTimeoutError::Timeout) => Ok(SessionEvent::Timeout),
            Err(RecvTimeoutError::Disconnected) => Ok(SessionEvent::Closed),
        }
    }

    fn send_line(&mut self, line: &str) -> DbdumpResult<()> {
        self.writer
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|e| DbdumpError::Io(format!("Failed to write to `{}`: {}", self.command, e)))
    }

    fn wait(&mut self) -> DbdumpResult<i32> {
        let status = self
            .child
            .wait()
            .map_err(|e| DbdumpError::Io(format!("Failed to wait for `{}`: {}", self.command, e)))?;
        Ok(status.exit_code() as i32)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn drain(session: &mut PtySession) -> String {
        let mut out = String::new();
        loop {
            match session.read(Duration::from_secs(5)).unwrap() {
                SessionEvent::Output(chunk) => out.push_str(&chunk),
                SessionEvent::Timeout => panic!("no output within timeout"),
                SessionEvent::Closed => return out,
            }
        }
    }

    #[test]
    fn test_pty_session_captures_output_and_exit_code() {
        let mut session = PtySession::spawn("sh -c 'echo hello; exit 4'").unwrap();
        let out = drain(&mut session);
        assert!(out.contains("hello"));
        assert_eq!(session.wait().unwrap(), 4);
    }

    #[test]
    fn test_pty_session_answers_prompt() {
        let mut session =
            PtySession::spawn("sh -c 'printf \"password: \"; read pw; echo got:$pw'").unwrap();

        let mut seen = String::new();
        while !seen.contains("password: ") {
            match session.read(Duration::from_secs(5)).unwrap() {
                SessionEvent::Output(chunk) => seen.push_str(&chunk),
                other => panic!("unexpected event: {other:?}"),
            }
        }
        session.send_line("secret").unwrap();

        let out = drain(&mut session);
        assert!(out.contains("got:secret"));
        assert_eq!(session.wait().unwrap(), 0);
    }
}
