//! Connection factories.

use std::future::Future;

use log::debug;

use crate::channel::{ShellChannel, SshShell};
use crate::error::TransportError;
use crate::inventory::Host;
use crate::transport::{SshConfig, SshOptions, SshTransport};

/// Opens a shell channel to an inventory host.
pub trait Connector: Send + Sync {
    /// The channel type produced.
    type Channel: ShellChannel;

    /// Connect, authenticate and start an interactive shell.
    fn connect(
        &self,
        host: &Host,
    ) -> impl Future<Output = Result<Self::Channel, TransportError>> + Send;
}

/// Connector for real devices over SSH.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: SshOptions,
}

impl SshConnector {
    /// Create a connector using the given SSH settings.
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    /// The SSH settings.
    pub fn options(&self) -> &SshOptions {
        &self.options
    }
}

impl Connector for SshConnector {
    type Channel = SshShell;

    async fn connect(&self, host: &Host) -> Result<SshShell, TransportError> {
        let config = SshConfig::for_host(host, &self.options);
        let transport = SshTransport::connect(&config).await?;

        match transport
            .open_shell(self.options.terminal_width, self.options.terminal_height)
            .await
        {
            Ok(channel) => Ok(SshShell::new(transport, channel)),
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("close after failed shell start on {}: {}", host, close_err);
                }
                Err(e)
            }
        }
    }
}
