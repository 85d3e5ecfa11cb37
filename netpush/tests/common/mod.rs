//! Loopback SSH server that behaves like a paginating network device.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::{Algorithm, PrivateKey};
use russh::server::{self, Auth, Msg, Server as _, Session};
use russh::{Channel, ChannelId, CryptoVec, Pty};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

use netpush::{HostKeyVerification, Inventory, SessionOptions, SshConnector, SshOptions};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "lab-password";

/// Closes the shell when received as a command line.
pub const EXIT: &[u8] = b"exit\n";

/// What the fake device prints and what it has received.
#[derive(Clone)]
pub struct LabDevice {
    banner: &'static str,

    /// Output for a command. Each continuation key gets the next page.
    pages: Arc<Vec<&'static str>>,

    received: Arc<Mutex<Vec<Vec<u8>>>>,

    /// Refuse session channels after login.
    refuse_channels: bool,
}

impl LabDevice {
    pub fn new(banner: &'static str, pages: &[&'static str]) -> Self {
        Self {
            banner,
            pages: Arc::new(pages.to_vec()),
            received: Arc::new(Mutex::new(Vec::new())),
            refuse_channels: false,
        }
    }

    /// A device that accepts the login but refuses to open a shell channel.
    pub fn refusing_channels() -> Self {
        Self {
            refuse_channels: true,
            ..Self::new("", &[])
        }
    }

    /// Writes received on the shell, in order.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }

    /// Listen on a loopback port and serve connections in the background.
    pub async fn spawn(self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = Arc::new(server::Config {
            keys: vec![PrivateKey::random(&mut OsRng, Algorithm::Ed25519).unwrap()],
            auth_rejection_time: Duration::from_millis(10),
            auth_rejection_time_initial: Some(Duration::ZERO),
            ..Default::default()
        });

        let mut server = self;
        tokio::spawn(async move {
            let _ = server.run_on_socket(config, &listener).await;
        });

        addr
    }
}

impl server::Server for LabDevice {
    type Handler = LabShell;

    fn new_client(&mut self, _peer: Option<SocketAddr>) -> LabShell {
        LabShell {
            device: self.clone(),
            next_page: 0,
            channels: Vec::new(),
        }
    }
}

/// Per-connection handler.
pub struct LabShell {
    device: LabDevice,
    next_page: usize,
    channels: Vec<Channel<Msg>>,
}

impl server::Handler for LabShell {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        if user == USERNAME && password == PASSWORD {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::reject())
        }
    }

    async fn channel_open_session(
        &mut self,
        channel: Channel<Msg>,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        if self.device.refuse_channels {
            return Ok(false);
        }
        self.channels.push(channel);
        Ok(true)
    }

    async fn pty_request(
        &mut self,
        channel: ChannelId,
        _term: &str,
        _col_width: u32,
        _row_height: u32,
        _pix_width: u32,
        _pix_height: u32,
        _modes: &[(Pty, u32)],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)
    }

    async fn shell_request(
        &mut self,
        channel: ChannelId,
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        session.channel_success(channel)?;
        if !self.device.banner.is_empty() {
            session.data(channel, CryptoVec::from(self.device.banner))?;
        }
        Ok(())
    }

    async fn data(
        &mut self,
        channel: ChannelId,
        data: &[u8],
        session: &mut Session,
    ) -> Result<(), Self::Error> {
        self.device.received.lock().unwrap().push(data.to_vec());

        if data == EXIT {
            session.eof(channel)?;
            return session.close(channel);
        }

        // A full line is a new command; anything else continues the pager.
        if data.ends_with(b"\n") {
            self.next_page = 0;
        }
        if let Some(page) = self.device.pages.get(self.next_page) {
            self.next_page += 1;
            session.data(channel, CryptoVec::from(*page))?;
        }
        Ok(())
    }
}

/// Inventory with one host `lab` at `addr`.
pub fn inventory(addr: SocketAddr, password: &str, commands: &[&str]) -> Inventory {
    let commands = serde_json::to_string(commands).unwrap();
    Inventory::from_json_str(&format!(
        r#"{{"hosts": {{"lab": {{"hostname": "{}", "username": "{USERNAME}",
            "password": "{password}", "port": {},
            "device": {{"commands": {commands}}}}}}}}}"#,
        addr.ip(),
        addr.port()
    ))
    .unwrap()
}

/// Write an inventory file for the command line.
pub fn inventory_file(addr: SocketAddr, commands: &[&str]) -> NamedTempFile {
    let commands = serde_json::to_string(commands).unwrap();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"hosts": {{"lab": {{"hostname": "{}", "username": "{USERNAME}",
            "password": "{PASSWORD}", "port": {},
            "device": {{"commands": {commands}}}}}}}}}"#,
        addr.ip(),
        addr.port()
    )
    .unwrap();
    file
}

/// An empty known_hosts file: every server key is unknown.
pub fn empty_known_hosts() -> NamedTempFile {
    NamedTempFile::new().unwrap()
}

pub fn connector(policy: HostKeyVerification, known_hosts: &NamedTempFile) -> SshConnector {
    SshConnector::new(SshOptions {
        timeout: Duration::from_secs(5),
        host_key_verification: policy,
        known_hosts_path: Some(known_hosts.path().to_path_buf()),
        ..SshOptions::default()
    })
}

pub fn session_options() -> SessionOptions {
    SessionOptions::default()
        .with_pacing_delay(Duration::from_millis(50))
        .with_read_timeout(Duration::from_secs(5))
}
