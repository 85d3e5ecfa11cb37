//! Interactive shell session to a single host.

use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use super::connector::Connector;
use super::options::SessionOptions;
use super::transcript::Transcript;
use crate::channel::{ShellChannel, TranscriptBuffer, decode_ascii_lossy};
use crate::error::{ConnectError, SessionError, TransportError};
use crate::inventory::Host;

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no connection attempted yet.
    Unconnected,
    /// Connection in progress.
    Connecting,
    /// Shell is up and accepting commands.
    Ready,
    /// Released by [`Session::close`].
    Closed,
    /// Connection attempt failed. Terminal.
    Failed,
}

/// One interactive shell to one host.
///
/// Commands are sent one at a time. Output that is paginated by the remote
/// shell is collected page by page until the pager marker no longer appears.
///
/// A session must be released with [`close`](Self::close); dropping a live
/// session logs a warning.
///
/// # Example
///
/// ```rust,no_run
/// use netpush::driver::{Session, SessionOptions, SshConnector};
/// use netpush::Inventory;
///
/// # async fn example() -> Result<(), netpush::Error> {
/// let inventory = Inventory::load("hosts.json")?;
/// let host = &inventory.hosts()[0];
///
/// let mut session = Session::open(&SshConnector::default(), host, SessionOptions::default()).await?;
/// for command in host.device().commands() {
///     println!("{}", session.send(command).await);
/// }
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Session<C: ShellChannel> {
    /// Inventory identifier of the host.
    host: String,

    options: SessionOptions,

    /// The shell. `None` before connecting and after closing.
    channel: Option<C>,

    state: SessionState,
}

impl<C: ShellChannel> Session<C> {
    /// Create an unconnected session.
    pub fn new(host: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            host: host.into(),
            options,
            channel: None,
            state: SessionState::Unconnected,
        }
    }

    /// Create a session and connect it.
    pub async fn open<K>(
        connector: &K,
        host: &Host,
        options: SessionOptions,
    ) -> Result<Self, ConnectError>
    where
        K: Connector<Channel = C>,
    {
        let mut session = Self::new(host.id(), options);
        session.connect(connector, host).await?;
        Ok(session)
    }

    /// Connect through `connector` and start the shell.
    ///
    /// On failure the session moves to [`SessionState::Failed`]; it is never
    /// retried.
    pub async fn connect<K>(&mut self, connector: &K, host: &Host) -> Result<(), ConnectError>
    where
        K: Connector<Channel = C>,
    {
        match self.state {
            SessionState::Unconnected => {}
            SessionState::Ready => {
                warn!("{}: session already connected", self.host);
                return Ok(());
            }
            state => {
                return Err(ConnectError::new(
                    &self.host,
                    TransportError::Unavailable { state: format!("{state:?}") },
                ));
            }
        }

        self.state = SessionState::Connecting;
        info!("{}: connecting to {}", self.host, host);

        match connector.connect(host).await {
            Ok(channel) => self.attach(channel).await,
            Err(source) => {
                self.state = SessionState::Failed;
                Err(ConnectError::new(&self.host, source))
            }
        }
    }

    /// Take ownership of a freshly started shell and discard its banner.
    pub async fn attach(&mut self, mut channel: C) -> Result<(), ConnectError> {
        match channel
            .read(self.options.max_read_bytes, self.options.read_timeout)
            .await
        {
            Ok(banner) => {
                debug!("{}: discarded {} byte banner", self.host, banner.len());
                trace!("{}: banner: {:?}", self.host, decode_ascii_lossy(&banner));
            }
            Err(SessionError::ReadTimeout(_)) => debug!("{}: no banner", self.host),
            Err(SessionError::Closed) => {
                self.state = SessionState::Failed;
                if let Err(e) = channel.close().await {
                    debug!("{}: close after failed start: {}", self.host, e);
                }
                return Err(ConnectError::new(&self.host, TransportError::Disconnected));
            }
            Err(e) => warn!("{}: failed to read banner: {}", self.host, e),
        }

        self.channel = Some(channel);
        self.state = SessionState::Ready;
        info!("{}: session ready", self.host);
        Ok(())
    }

    /// Send a command and collect its output across pager pages.
    ///
    /// Channel errors do not propagate: the output gathered so far is
    /// returned with [`Transcript::error`] set.
    pub async fn send(&mut self, command: &str) -> Transcript {
        let start = Instant::now();

        let channel = match (self.state, self.channel.as_mut()) {
            (SessionState::Ready, Some(channel)) => channel,
            _ => {
                error!("{}: cannot send {:?}: session not ready", self.host, command);
                return Transcript::truncated(
                    command,
                    "",
                    0,
                    Duration::ZERO,
                    SessionError::NotReady,
                );
            }
        };

        info!("{}: executing command: {}", self.host, command);

        let mut buffer = TranscriptBuffer::new();
        let mut continuations = 0;
        let result = Self::exchange(
            channel,
            &self.options,
            command,
            &mut buffer,
            &mut continuations,
        )
        .await;

        let output = buffer.to_ascii_lossy();
        let elapsed = start.elapsed();

        match result {
            Ok(()) => {
                debug!(
                    "{}: {:?} returned {} bytes in {:?} ({} continuations)",
                    self.host,
                    command,
                    buffer.len(),
                    elapsed,
                    continuations
                );
                Transcript::new(command, output, continuations, elapsed)
            }
            Err(e) => {
                error!("{}: command {:?} interrupted: {}", self.host, command, e);
                Transcript::truncated(command, output, continuations, elapsed, e)
            }
        }
    }

    /// Write the command, then read until no pager marker is left.
    async fn exchange(
        channel: &mut C,
        options: &SessionOptions,
        command: &str,
        buffer: &mut TranscriptBuffer,
        continuations: &mut usize,
    ) -> Result<(), SessionError> {
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');

        channel.write(&line).await?;
        tokio::time::sleep(options.pacing_delay).await;
        buffer.push(&channel.read(options.max_read_bytes, options.read_timeout).await?);

        while buffer.last_chunk_contains(options.pager_marker.as_bytes()) {
            if *continuations >= options.max_continuations {
                return Err(SessionError::PagerLimitExceeded {
                    limit: options.max_continuations,
                });
            }

            trace!("pager prompt found, requesting next page");
            channel.write(options.continuation.as_bytes()).await?;
            *continuations += 1;

            tokio::time::sleep(options.pacing_delay).await;
            buffer.push(&channel.read(options.max_read_bytes, options.read_timeout).await?);
        }

        Ok(())
    }

    /// Send several commands in order.
    pub async fn send_all<S: AsRef<str>>(&mut self, commands: &[S]) -> Vec<Transcript> {
        let mut transcripts = Vec::with_capacity(commands.len());
        for command in commands {
            transcripts.push(self.send(command.as_ref()).await);
        }
        transcripts
    }

    /// Release the shell.
    ///
    /// Safe to call more than once and on sessions that never connected.
    /// Errors are logged, never returned.
    pub async fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            match channel.close().await {
                Ok(()) => debug!("{}: session closed", self.host),
                Err(e) => warn!("{}: error while closing session: {}", self.host, e),
            }
        }

        if self.state != SessionState::Failed {
            self.state = SessionState::Closed;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if commands can be sent.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Inventory identifier of the host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The options this session runs with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl<C: ShellChannel> Drop for Session<C> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!("{}: session dropped without close()", self.host);
        }
    }
}
