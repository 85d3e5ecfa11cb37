//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use russh::Channel;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use secrecy::ExposeSecret;

use super::config::{HostKeyVerification, SshConfig};
use crate::error::TransportError;

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// `host:port`, for log messages.
    peer: String,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate with the password.
    pub async fn connect(config: &SshConfig) -> Result<Self, TransportError> {
        let timeout = config.options.timeout;
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(timeout),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.options.host_key_verification,
            known_hosts_path: config.options.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());

        let mut session = tokio::time::timeout(
            timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
        .map_err(|e| {
            // Prefer the detailed host key error over russh's generic one
            let stored = host_key_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            stored.unwrap_or(TransportError::Ssh(e))
        })?;

        let success = session
            .authenticate_password(&config.username, config.password.expose_secret())
            .await?
            .success();

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        debug!("authenticated to {} as {}", config.socket_addr(), config.username);

        Ok(Self {
            session,
            peer: config.socket_addr(),
        })
    }

    /// Open a session channel with a PTY and an interactive shell.
    pub async fn open_shell(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Channel<Msg>, TransportError> {
        let channel = self.session.channel_open_session().await?;

        channel
            .request_pty(true, "xterm", width, height, 0, 0, &[])
            .await?;

        channel.request_shell(true).await?;

        Ok(channel)
    }

    /// Remote peer as `host:port`.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Close the connection.
    pub async fn close(self) -> Result<(), russh::Error> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn reject(&self, error: TransportError) -> bool {
        *self
            .host_key_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(error);
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::Warn => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    warn!(
                        "Unknown {} host key for {}:{}, accepting",
                        server_public_key.algorithm(),
                        self.host,
                        self.port
                    );
                    Ok(true)
                }
                Err(e @ TransportError::HostKeyChanged { .. }) => Ok(self.reject(e)),
                Err(e) => {
                    warn!("Could not check known_hosts for {}: {}", self.host, e);
                    Ok(true)
                }
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
