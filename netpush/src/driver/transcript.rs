//! Transcript type for command execution results.

use std::time::Duration;

use crate::error::SessionError;

/// Everything the remote shell printed in response to one command.
#[derive(Debug)]
pub struct Transcript {
    /// The command that was sent.
    pub command: String,

    /// Output text, including every pager page.
    pub output: String,

    /// Number of pager continuations sent.
    pub continuations: usize,

    /// Time taken from write to last read.
    pub elapsed: Duration,

    /// Why the output is incomplete, if it is.
    pub error: Option<SessionError>,
}

impl Transcript {
    /// Create a complete transcript.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        continuations: usize,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            continuations,
            elapsed,
            error: None,
        }
    }

    /// Create a transcript cut short by `error`.
    pub fn truncated(
        command: impl Into<String>,
        output: impl Into<String>,
        continuations: usize,
        elapsed: Duration,
        error: SessionError,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            continuations,
            elapsed,
            error: Some(error),
        }
    }

    /// Check whether the whole response was collected.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }

    /// Get the output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}
