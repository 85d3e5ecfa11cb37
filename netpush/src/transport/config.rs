//! SSH connection configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::inventory::Host;

/// Host key verification mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Accept unknown keys with a warning, reject keys that changed.
    /// Nothing is written to known_hosts.
    #[default]
    Warn,

    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept all keys without checking. For testing and lab use only.
    Disabled,
}

impl FromStr for HostKeyVerification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            "off" | "disabled" | "none" => Ok(Self::Disabled),
            other => Err(format!(
                "unknown host key policy '{other}' (expected warn, strict or off)"
            )),
        }
    }
}

/// Settings shared by every connection of a run.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// Connection timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file. `None` uses `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// SSH connection configuration for one host.
#[derive(Debug)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Password. Only password authentication is attempted.
    pub password: SecretString,

    /// Connection-wide settings.
    pub options: SshOptions,
}

impl SshConfig {
    /// Build the configuration for an inventory host.
    pub fn for_host(host: &Host, options: &SshOptions) -> Self {
        Self {
            host: host.address().to_string(),
            port: host.port(),
            username: host.login_user(),
            password: SecretString::from(host.password().expose_secret().to_owned()),
            options: options.clone(),
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
