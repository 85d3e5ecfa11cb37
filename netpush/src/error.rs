//! Error types for netpush.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netpush operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Inventory loading or validation errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Failure to open a session to one host
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Failure writing the run report
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

/// Inventory errors. Always fatal, raised before any connection is attempted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The inventory file could not be read
    #[error("Failed to read inventory '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The inventory is not valid JSON or has the wrong shape
    #[error("Invalid inventory document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required host field is missing or empty
    #[error("Host '{host}': missing or empty field '{field}'")]
    MissingField { host: String, field: &'static str },

    /// Port outside the TCP range
    #[error("Host '{host}': invalid port {port}")]
    InvalidPort { host: String, port: i64 },

    /// A substitution token was the empty string
    #[error("Substitution token must not be empty")]
    EmptyToken,

    /// The device block of a host is invalid
    #[error("Host '{host}': invalid device: {source}")]
    Device {
        host: String,
        #[source]
        source: Box<ConfigError>,
    },
}

/// Transport layer errors (SSH connection, authentication, shell setup).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key not present in known_hosts (strict verification only)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// The shell closed before it produced any output
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Connect attempted on a session that already closed or failed
    #[error("Session is {state}, it cannot be reconnected")]
    Unavailable { state: String },
}

/// Failure to open a session to a single host.
#[derive(Error, Debug)]
#[error("Failed to connect to '{host}': {source}")]
pub struct ConnectError {
    /// Inventory identifier of the host.
    pub host: String,

    #[source]
    pub source: TransportError,
}

impl ConnectError {
    /// Create a connect error for the given host.
    pub fn new(host: impl Into<String>, source: TransportError) -> Self {
        Self {
            host: host.into(),
            source,
        }
    }
}

/// Errors on a live shell channel.
///
/// These never abort a run: they are recorded on the [`Transcript`] of the
/// command that hit them.
///
/// [`Transcript`]: crate::driver::Transcript
#[derive(Error, Debug)]
pub enum SessionError {
    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// The remote side closed the channel
    #[error("Channel closed")]
    Closed,

    /// No output arrived in time
    #[error("No output within {0:?}")]
    ReadTimeout(Duration),

    /// The pager kept asking for more output
    #[error("Pager still active after {limit} continuations")]
    PagerLimitExceeded { limit: usize },

    /// Command sent on a session that is not ready
    #[error("Session not ready - connect first")]
    NotReady,
}

/// Result type alias using netpush's Error.
pub type Result<T> = std::result::Result<T, Error>;
