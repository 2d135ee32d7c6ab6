//! Off-site synchronization of dumps with rsync
//!
//! # Directions
//!
//! - Push: the dump directory is copied to `rsync.destination`, with
//!   `--delete` when `rsync.delete` is set.
//! - Pull: `rsync.destination` is copied into the dump directory's parent.
//!
//! # Passwords
//!
//! When `rsync.password` is set, rsync runs under a pseudo-terminal and the
//! [`Handshake`] state machine answers the host key and password prompts.
//! Without a password the handshake is skipped.
//!
//! # Example
//!
//! ```rust,ignore
//! use dbdump::sync::{ensure_success, SyncDirection, SyncLog, SyncRunner};
//!
//! let log = SyncLog::new();
//! let runner = SyncRunner::new(&settings.rsync, &settings.dump_dir);
//! let result = runner.run(SyncDirection::Push, Some(log.path()));
//! print!("{}", log.contents());
//! ensure_success(result?)?;
//! ```

mod command;
mod handshake;
mod runner;
mod session;

pub use command::{build_command, SyncDirection};
pub use handshake::{Handshake, HandshakeFailure, HandshakeState};
pub use runner::{drive, ensure_success, SyncLog, SyncRunner};
pub use session::{PtySession, SessionEvent, SyncSession};
