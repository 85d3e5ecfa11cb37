//! Host and device inventory.
//!
//! The inventory is a JSON document mapping host identifiers to connection
//! parameters and a device block:
//!
//! ```json
//! {
//!   "hosts": {
//!     "core-sw1": {
//!       "hostname": "10.0.0.1",
//!       "username": "admin",
//!       "password": "secret",
//!       "port": 22,
//!       "device": {
//!         "replace": { "{IF}": "Gi0/1" },
//!         "commands": ["conf t", "interface {IF}", "no shutdown"]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Command templates are resolved once, when the [`Device`] is built.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::template::Substitutions;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Inventory document as it appears on disk.
#[derive(Debug, Deserialize)]
pub struct RawInventory {
    pub hosts: IndexMap<String, RawHost>,
}

/// A single host entry as it appears on disk.
#[derive(Debug, Deserialize)]
pub struct RawHost {
    pub hostname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<i64>,
    pub device: RawDevice,
}

/// A device block as it appears on disk.
#[derive(Debug, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub replace: IndexMap<String, String>,
    pub commands: Vec<String>,
}

/// A device: its substitution table and resolved commands.
#[derive(Debug, Clone)]
pub struct Device {
    substitutions: Substitutions,
    commands: Vec<String>,
}

impl Device {
    /// Build a device, resolving every command template.
    pub fn build(raw: RawDevice) -> Result<Self, ConfigError> {
        if raw.replace.keys().any(String::is_empty) {
            return Err(ConfigError::EmptyToken);
        }

        let substitutions = Substitutions::new(raw.replace);
        let commands = raw
            .commands
            .iter()
            .map(|template| substitutions.apply(template))
            .collect();

        Ok(Self {
            substitutions,
            commands,
        })
    }

    /// The resolved commands, in send order.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The substitution table the commands were resolved with.
    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }
}

/// Connection parameters for one host plus its device.
#[derive(Debug)]
pub struct Host {
    id: String,
    address: String,
    username: Option<String>,
    password: SecretString,
    port: u16,
    device: Device,
}

impl Host {
    /// Build a host from its inventory entry.
    pub fn build(id: impl Into<String>, raw: RawHost) -> Result<Self, ConfigError> {
        let id = id.into();

        let address = raw
            .hostname
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                host: id.clone(),
                field: "hostname",
            })?;

        let password = raw
            .password
            .filter(|p| !p.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingField {
                host: id.clone(),
                field: "password",
            })?;

        let port = match raw.port {
            None | Some(0) => DEFAULT_PORT,
            Some(port) => u16::try_from(port).map_err(|_| ConfigError::InvalidPort {
                host: id.clone(),
                port,
            })?,
        };

        let device = Device::build(raw.device).map_err(|source| ConfigError::Device {
            host: id.clone(),
            source: Box::new(source),
        })?;

        Ok(Self {
            id,
            address,
            username: raw.username.filter(|u| !u.is_empty()),
            password,
            port,
            device,
        })
    }

    /// Inventory identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Network address (hostname or IP).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Configured username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Username to log in with: the configured one, else the local user.
    pub fn login_user(&self) -> String {
        self.username.clone().unwrap_or_else(current_os_user)
    }

    /// Password for authentication.
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// SSH port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The device block.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

/// All configured hosts.
#[derive(Debug, Default)]
pub struct Inventory {
    hosts: Vec<Host>,
}

impl Inventory {
    /// Build an inventory from a parsed document.
    pub fn build(raw: RawInventory) -> Result<Self, ConfigError> {
        let hosts = raw
            .hosts
            .into_iter()
            .map(|(id, host)| Host::build(id, host))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { hosts })
    }

    /// Parse an inventory from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::build(serde_json::from_str(json)?)
    }

    /// Parse an inventory from a reader.
    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        Self::build(serde_json::from_reader(reader)?)
    }

    /// Load an inventory file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let inventory = Self::from_reader(BufReader::new(file))?;
        debug!("loaded {} host(s) from {}", inventory.len(), path.display());
        Ok(inventory)
    }

    /// Hosts in document order.
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// Look up a host by identifier.
    pub fn get(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.id == id)
    }

    /// Number of hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if the inventory has no hosts.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Name of the user running this process.
fn current_os_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "root".to_string())
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.username {
            Some(user) => write!(f, "{}@{}:{}", user, self.address, self.port),
            None => write!(f, "{}:{}", self.address, self.port),
        }
    }
}
