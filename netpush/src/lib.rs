//! # Netpush
//!
//! Push templated configuration commands to network devices over
//! interactive SSH shells.
//!
//! Netpush reads a JSON inventory of hosts, resolves each device's command
//! templates against its substitution table, then logs into every host in
//! turn, sends the commands through a PTY shell and prints what the device
//! answered. Paginated output (`<--- More --->`) is followed page by page.
//!
//! ## Features
//!
//! - Async SSH connections via russh, password authentication
//! - Longest-match token substitution in command templates
//! - Pager handling with a bounded number of continuations
//! - Sequential, per-host failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netpush::{Inventory, Runner, SessionOptions, SshConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netpush::Error> {
//!     let inventory = Inventory::load("hosts.json")?;
//!     let runner = Runner::new(SshConnector::default(), SessionOptions::default());
//!
//!     let report = runner.run(&inventory, &mut std::io::stdout()).await?;
//!     if report.has_failures() {
//!         eprintln!("some hosts could not be reached");
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod runner;
pub mod template;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Connector, Session, SessionOptions, SessionState, SshConnector, Transcript};
pub use error::{ConfigError, ConnectError, Error, SessionError, TransportError};
pub use inventory::{Device, Host, Inventory};
pub use runner::{HostOutcome, RunReport, Runner};
pub use template::{Substitutions, resolve};
pub use transport::{HostKeyVerification, SshOptions};
