//! Password prompt handshake
//!
//! rsync over ssh asks for the password on the controlling terminal, so the
//! answer has to be typed into a pseudo-terminal rather than piped to stdin.
//! [`Handshake`] is a state machine fed with terminal output; it says what to
//! type back and when the exchange is over.
//!
//! ```text
//! AwaitingPrompt --host key prompt--> AwaitingPassword --password prompt--> AwaitingResponse
//!       |                                   |                                   |
//!       +-----------password prompt---------+-----------------------------------+
//!                                                                               v
//!                                       Failed(AuthFailed) <--denied-- / --other output--> Done
//! ```

/// Current step of the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for a host key or password prompt
    AwaitingPrompt,
    /// Host key accepted, waiting for the password prompt
    AwaitingPassword,
    /// Password sent, waiting for the remote's reaction
    AwaitingResponse,
    Done,
    Failed(HandshakeFailure),
}

/// Why the handshake failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeFailure {
    /// No prompt arrived within the timeout
    Timeout,
    /// The remote rejected the password
    AuthFailed,
}

const PERMISSION_DENIED: &str = "Permission denied";

/// Bytes of recent output kept for prompt matching; prompts are short and
/// arrive last, so older output is dropped
const BUFFER_WINDOW: usize = 256;

/// Drives the prompt/answer exchange
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    password: String,
    buffer: String,
}

impl Handshake {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            state: HandshakeState::AwaitingPrompt,
            password: password.into(),
            buffer: String::new(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Done or failed
    pub fn is_finished(&self) -> bool {
        matches!(self.state, HandshakeState::Done | HandshakeState::Failed(_))
    }

    /// Feed terminal output; returns the line to type back, if any
    pub fn on_output(&mut self, chunk: &str) -> Option<String> {
        if self.is_finished() {
            return None;
        }
        self.push_output(chunk);

        match self.state {
            HandshakeState::AwaitingPrompt => {
                if is_host_key_prompt(&self.buffer) {
                    self.advance(HandshakeState::AwaitingPassword);
                    Some("yes".to_string())
                } else if is_password_prompt(&self.buffer) {
                    self.advance(HandshakeState::AwaitingResponse);
                    Some(self.password.clone())
                } else {
                    None
                }
            }
            HandshakeState::AwaitingPassword => {
                if is_password_prompt(&self.buffer) {
                    self.advance(HandshakeState::AwaitingResponse);
                    Some(self.password.clone())
                } else {
                    None
                }
            }
            HandshakeState::AwaitingResponse => {
                if self.buffer.contains(PERMISSION_DENIED) {
                    self.advance(HandshakeState::Failed(HandshakeFailure::AuthFailed));
                } else if !self.buffer.trim().is_empty() {
                    self.advance(HandshakeState::Done);
                }
                None
            }
            HandshakeState::Done | HandshakeState::Failed(_) => None,
        }
    }

    /// No output arrived within the timeout
    ///
    /// Silence after the password was sent counts as acceptance.
    pub fn on_timeout(&mut self) {
        match self.state {
            HandshakeState::AwaitingPrompt | HandshakeState::AwaitingPassword => {
                self.advance(HandshakeState::Failed(HandshakeFailure::Timeout));
            }
            HandshakeState::AwaitingResponse => self.advance(HandshakeState::Done),
            HandshakeState::Done | HandshakeState::Failed(_) => {}
        }
    }

    fn push_output(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
        if self.buffer.len() > BUFFER_WINDOW {
            let mut cut = self.buffer.len() - BUFFER_WINDOW;
            while !self.buffer.is_char_boundary(cut) {
                cut += 1;
            }
            self.buffer.drain(..cut);
        }
    }

    fn advance(&mut self, next: HandshakeState) {
        tracing::trace!(from = ?self.state, to = ?next, "handshake transition");
        self.state = next;
        self.buffer.clear();
    }
}

fn is_host_key_prompt(output: &str) -> bool {
    output.contains("Are you sure you want to continue connecting") && output.contains("(yes/no")
}

fn is_password_prompt(output: &str) -> bool {
    output.to_ascii_lowercase().contains("password:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_password_prompt() {
        let mut hs = Handshake::new("pw");
        assert_eq!(hs.on_output("backup@example.com's password: "), Some("pw".into()));
        assert_eq!(hs.state(), HandshakeState::AwaitingResponse);

        assert_eq!(hs.on_output("\r\n"), None);
        assert_eq!(hs.state(), HandshakeState::AwaitingResponse);

        assert_eq!(hs.on_output("sending incremental file list\r\n"), None);
        assert_eq!(hs.state(), HandshakeState::Done);
        assert!(hs.is_finished());
    }

    #[test]
    fn test_host_key_then_password() {
        let mut hs = Handshake::new("pw");
        let reply = hs.on_output(
            "The authenticity of host 'example.com' can't be established.\r\n\
             Are you sure you want to continue connecting (yes/no/[fingerprint])? ",
        );
        assert_eq!(reply, Some("yes".into()));
        assert_eq!(hs.state(), HandshakeState::AwaitingPassword);

        assert_eq!(hs.on_output("Warning: Permanently added 'example.com'\r\n"), None);
        assert_eq!(hs.on_output("backup@example.com's pass"), None);
        assert_eq!(hs.on_output("word: "), Some("pw".into()));
        assert_eq!(hs.state(), HandshakeState::AwaitingResponse);
    }

    #[test]
    fn test_permission_denied() {
        let mut hs = Handshake::new("wrong");
        hs.on_output("Password: ");
        hs.on_output("Permission denied, please try again.\r\n");
        assert_eq!(
            hs.state(),
            HandshakeState::Failed(HandshakeFailure::AuthFailed)
        );
        assert_eq!(hs.on_output("Password: "), None);
    }

    #[test]
    fn test_timeout_before_prompt() {
        let mut hs = Handshake::new("pw");
        hs.on_output("connecting...\r\n");
        hs.on_timeout();
        assert_eq!(hs.state(), HandshakeState::Failed(HandshakeFailure::Timeout));
    }

    #[test]
    fn test_timeout_after_host_key() {
        let mut hs = Handshake::new("pw");
        hs.on_output("Are you sure you want to continue connecting (yes/no)? ");
        hs.on_timeout();
        assert_eq!(hs.state(), HandshakeState::Failed(HandshakeFailure::Timeout));
    }

    #[test]
    fn test_buffer_stays_bounded_under_streaming_output() {
        let mut hs = Handshake::new("pw");
        let line = "default__2024.tar.gz  1,024 100%  1.00MB/s  0:00:00 (xfr#1) é\r\n";
        for _ in 0..10_000 {
            assert_eq!(hs.on_output(line), None);
            assert!(hs.buffer.len() <= BUFFER_WINDOW);
        }
        assert_eq!(hs.state(), HandshakeState::AwaitingPrompt);

        assert_eq!(hs.on_output("backup@host's password: "), Some("pw".into()));
    }

    #[test]
    fn test_prompt_split_across_chunks_after_long_output() {
        let mut hs = Handshake::new("pw");
        hs.on_output(&"x".repeat(4 * BUFFER_WINDOW));
        assert_eq!(hs.on_output("Pass"), None);
        assert_eq!(hs.on_output("word: "), Some("pw".into()));
    }

    #[test]
    fn test_silence_after_password_is_done() {
        let mut hs = Handshake::new("pw");
        hs.on_output("password: ");
        hs.on_timeout();
        assert_eq!(hs.state(), HandshakeState::Done);
    }
}
