//! Incremental terminal rendering of a session transcript.
//!
//! The terminal already echoes what the user typed, so only assistant entries
//! and the typing indicator are written. Each call renders just what changed
//! since the previous call, keeping the newest entry at the bottom of the
//! scrollback.

use std::io::{self, Write};

use carechat::{Role, SessionState};

pub const TYPING_INDICATOR: &str = "Assistant is typing...";

#[derive(Debug, Default)]
pub struct Transcript {
    shown: usize,
    typing_shown: bool,
    echo_user: bool,
}

impl Transcript {
    /// Renderer that also prints user entries (for non-interactive output).
    #[must_use]
    pub fn echoing_user() -> Self {
        Self { echo_user: true, ..Self::default() }
    }

    /// Write every entry appended since the last call.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn render(&mut self, state: &SessionState, out: &mut impl Write) -> io::Result<()> {
        for message in state.messages.iter().skip(self.shown) {
            match message.role {
                Role::Assistant => writeln!(out, "Assistant: {}", message.content)?,
                Role::User if self.echo_user => writeln!(out, "You: {}", message.content)?,
                Role::User => {}
            }
        }
        self.shown = state.messages.len();

        if state.waiting && !self.typing_shown {
            writeln!(out, "  {TYPING_INDICATOR}")?;
        }
        self.typing_shown = state.waiting;

        out.flush()
    }
}

#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;
