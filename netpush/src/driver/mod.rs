//! Interactive session client.
//!
//! The driver layer provides the main API for sending commands to one
//! device: open a [`Session`] through a [`Connector`], [`send`] commands,
//! [`close`] it.
//!
//! [`send`]: Session::send
//! [`close`]: Session::close

mod connector;
mod options;
mod session;
mod transcript;

pub use connector::{Connector, SshConnector};
pub use options::{DEFAULT_CONTINUATION, DEFAULT_PAGER_MARKER, SessionOptions};
pub use session::{Session, SessionState};
pub use transcript::Transcript;
