//! Session tuning options.

use std::time::Duration;

/// Pager prompt printed by the devices this tool targets.
pub const DEFAULT_PAGER_MARKER: &str = "<--- More --->";

/// Key sent to advance the pager. No newline is appended.
pub const DEFAULT_CONTINUATION: &str = " ";

/// Options controlling how a session talks to the remote shell.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use netpush::driver::SessionOptions;
///
/// let options = SessionOptions::default()
///     .with_pacing_delay(Duration::from_millis(250))
///     .with_pager_marker("--More--")
///     .with_max_continuations(50);
/// assert_eq!(options.max_continuations, 50);
/// ```
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Delay after every write before reading, so the remote shell is not
    /// flooded and has produced its output.
    pub pacing_delay: Duration,

    /// Maximum bytes consumed per read.
    pub max_read_bytes: usize,

    /// How long a read waits for the first byte.
    pub read_timeout: Duration,

    /// Literal text that signals a paginated screen.
    pub pager_marker: String,

    /// Bytes sent to get the next page.
    pub continuation: String,

    /// Upper bound on continuations for a single command.
    pub max_continuations: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_millis(500),
            max_read_bytes: 65535,
            read_timeout: Duration::from_secs(10),
            pager_marker: DEFAULT_PAGER_MARKER.to_string(),
            continuation: DEFAULT_CONTINUATION.to_string(),
            max_continuations: 1000,
        }
    }
}

impl SessionOptions {
    /// Set the delay between a write and the following read.
    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    /// Set the per-read byte limit (at least 1).
    pub fn with_max_read_bytes(mut self, max: usize) -> Self {
        self.max_read_bytes = max.max(1);
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the pager marker. An empty marker disables pager handling.
    pub fn with_pager_marker(mut self, marker: impl Into<String>) -> Self {
        self.pager_marker = marker.into();
        self
    }

    /// Set the continuation key.
    pub fn with_continuation(mut self, key: impl Into<String>) -> Self {
        self.continuation = key.into();
        self
    }

    /// Set the continuation cap.
    pub fn with_max_continuations(mut self, max: usize) -> Self {
        self.max_continuations = max;
        self
    }
}
