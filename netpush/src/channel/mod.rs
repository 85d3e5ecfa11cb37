//! Channel layer for shell I/O.
//!
//! This module holds the byte-level shell abstraction used by sessions and
//! the buffer that accumulates one command's output across pager pages.

mod buffer;
#[cfg(test)]
pub(crate) mod scripted;
mod shell;

pub use buffer::{TranscriptBuffer, decode_ascii_lossy};
pub use shell::{ShellChannel, SshShell};
