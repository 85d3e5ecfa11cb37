//! Byte-level shell channel abstraction.

use std::future::Future;
use std::time::Duration;

use bytes::BytesMut;
use futures_util::FutureExt;
use log::{debug, trace, warn};
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use crate::error::SessionError;
use crate::transport::SshTransport;

/// An interactive shell the session can write to and read from.
///
/// Implemented by [`SshShell`] for real devices; tests substitute scripted
/// channels.
pub trait ShellChannel: Send {
    /// Write raw bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Read the output that is available, at most `max` bytes.
    ///
    /// Waits up to `timeout` for the first byte, then returns whatever has
    /// already arrived without waiting further.
    fn read(
        &mut self,
        max: usize,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>, SessionError>> + Send;

    /// Release the channel and its connection.
    fn close(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// A PTY shell over an SSH connection.
pub struct SshShell {
    channel: Channel<Msg>,

    /// Owning connection. `None` once closed.
    transport: Option<SshTransport>,

    /// Data received but not yet handed out.
    pending: BytesMut,

    /// Whether the remote side sent EOF or closed the channel.
    eof: bool,
}

impl SshShell {
    /// Wrap an open shell channel and its connection.
    pub fn new(transport: SshTransport, channel: Channel<Msg>) -> Self {
        Self {
            channel,
            transport: Some(transport),
            pending: BytesMut::with_capacity(4096),
            eof: false,
        }
    }

    fn absorb(&mut self, msg: Option<ChannelMsg>) {
        match msg {
            Some(ChannelMsg::Data { ref data }) => self.pending.extend_from_slice(data),
            Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                self.pending.extend_from_slice(data)
            }
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                debug!("shell channel closed by remote");
                self.eof = true;
            }
            Some(other) => trace!("ignoring channel message: {:?}", other),
        }
    }
}

impl ShellChannel for SshShell {
    async fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if self.eof {
            return Err(SessionError::Closed);
        }
        self.channel.data(data).await?;
        Ok(())
    }

    async fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, SessionError> {
        let deadline = tokio::time::Instant::now() + timeout;

        while self.pending.is_empty() && !self.eof {
            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| SessionError::ReadTimeout(timeout))?;
            self.absorb(msg);
        }

        // Take whatever else is already queued, without waiting.
        while self.pending.len() < max && !self.eof {
            match self.channel.wait().now_or_never() {
                Some(msg) => self.absorb(msg),
                None => break,
            }
        }

        if self.pending.is_empty() {
            return Err(SessionError::Closed);
        }

        let n = self.pending.len().min(max);
        Ok(self.pending.split_to(n).to_vec())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };

        if let Err(e) = self.channel.close().await {
            // The connection is torn down below regardless.
            warn!("failed to close shell channel on {}: {}", transport.peer(), e);
        }

        transport.close().await?;
        Ok(())
    }
}
