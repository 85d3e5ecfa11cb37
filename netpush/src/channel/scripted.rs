//! Scripted shell channel for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::ShellChannel;
use crate::error::SessionError;

/// What a scripted channel saw.
#[derive(Debug, Default)]
pub(crate) struct ChannelLog {
    pub writes: Vec<Vec<u8>>,
    pub reads: usize,
    pub closes: usize,
}

/// A channel that replays canned reads and records writes.
pub(crate) struct ScriptedChannel {
    reads: VecDeque<Result<Vec<u8>, SessionError>>,
    /// Returned once `reads` is exhausted; `None` means read timeouts.
    repeat: Option<Vec<u8>>,
    fail_close: bool,
    log: Arc<Mutex<ChannelLog>>,
}

impl ScriptedChannel {
    pub fn new(reads: Vec<Result<Vec<u8>, SessionError>>) -> Self {
        Self {
            reads: reads.into(),
            repeat: None,
            fail_close: false,
            log: Arc::default(),
        }
    }

    pub fn from_chunks(chunks: &[&str]) -> Self {
        Self::new(chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect())
    }

    pub fn repeating(mut self, chunk: &str) -> Self {
        self.repeat = Some(chunk.as_bytes().to_vec());
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<ChannelLog>> {
        self.log.clone()
    }
}

impl ShellChannel for ScriptedChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.log.lock().unwrap().writes.push(data.to_vec());
        Ok(())
    }

    async fn read(&mut self, max: usize, timeout: Duration) -> Result<Vec<u8>, SessionError> {
        self.log.lock().unwrap().reads += 1;
        match self.reads.pop_front() {
            Some(Ok(mut chunk)) => {
                chunk.truncate(max);
                Ok(chunk)
            }
            Some(Err(e)) => Err(e),
            None => self
                .repeat
                .clone()
                .ok_or(SessionError::ReadTimeout(timeout)),
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.log.lock().unwrap().closes += 1;
        if self.fail_close {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}
