//! PTY channel for interactive device sessions.
//!
//! Two ways of deciding that a command has finished:
//!
//! - [`PtyChannel::read_until_pattern`] blocks until the prompt reappears.
//! - [`PtyChannel::read_until_idle`] drains output until the device has been
//!   quiet for a settling window. Used by devices whose CLI redraws the
//!   prompt or streams output in bursts, where the prompt is not a reliable
//!   completion signal.

use std::future::Future;
use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Byte-level access to an interactive shell.
///
/// Implemented for russh channels; tests script their own.
pub trait ShellIo: Send {
    /// Write raw bytes to the shell.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Next chunk of output, `None` once the remote side has closed.
    fn read(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Signal end of input and release the channel.
    fn shutdown(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

impl ShellIo for Channel<Msg> {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data(data).await.map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(other) => trace!("ignoring channel message {:?}", other),
            }
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.eof().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Bytes from the end of the buffer searched for prompts.
    pub search_depth: usize,

    /// Line terminator appended to every sent line.
    pub return_char: String,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            search_depth: 1000,
            return_char: "\n".to_string(),
        }
    }
}

/// Interactive channel with prompt-synchronised and timed-drain reads.
pub struct PtyChannel<T> {
    io: T,
    buffer: PatternBuffer,
    config: PtyConfig,
}

impl<T: ShellIo> PtyChannel<T> {
    pub fn new(io: T, config: PtyConfig) -> Self {
        Self {
            io,
            buffer: PatternBuffer::new(config.search_depth),
            config,
        }
    }

    /// Send one line of input.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        let line = format!("{}{}", input, self.config.return_char);
        self.io.write(line.as_bytes()).await
    }

    /// Read until `pattern` matches the tail of the output.
    ///
    /// Returns everything up to and including the match; output that arrived
    /// after the match stays buffered for the next read.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some((_, end)) = self.buffer.find_in_tail(pattern) {
                return Ok(self.buffer.drain_to(end));
            }

            let chunk = tokio::time::timeout_at(deadline, self.io.read())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))??;

            match chunk {
                Some(data) => self.buffer.extend(&data),
                None => return Err(ChannelError::Closed.into()),
            }
        }
    }

    /// Read until no output has arrived for `idle`.
    ///
    /// Fails with [`ChannelError::DrainTimeout`] if the device is still
    /// talking when `timeout` runs out. A remote close ends the drain with
    /// whatever was collected.
    pub async fn read_until_idle(&mut self, idle: Duration, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            let now = Instant::now();
            let settle_at = now + idle;
            let wait_until = settle_at.min(deadline);

            match tokio::time::timeout_at(wait_until, self.io.read()).await {
                Err(_) if settle_at <= deadline => break,
                Err(_) => return Err(ChannelError::DrainTimeout(timeout).into()),
                Ok(chunk) => match chunk? {
                    Some(data) => self.buffer.extend(&data),
                    None => break,
                },
            }
        }

        Ok(self.buffer.take())
    }

    /// Release the underlying shell.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.io.shutdown().await
    }
}
