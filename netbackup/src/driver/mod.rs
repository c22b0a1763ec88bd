//! High-level driver for device interaction.
//!
//! The driver layer provides the main API for sending commands
//! and managing privilege levels on network devices.

mod builder;
mod generic;
mod privilege;
pub(crate) mod response;
mod session;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::{PrivilegeManager, Transition};
pub use response::Response;
pub use session::ShellSession;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// How the end of a command's output is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Read until the device prompt reappears.
    PromptSynchronized,

    /// Read until no output has arrived for `last_read`.
    ///
    /// For CLIs that redraw the prompt while streaming, like RouterOS.
    TimedDrain { last_read: Duration },
}

/// Trait for device drivers.
pub trait Driver: Send {
    /// Open the connection to the device and prepare the shell.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send a command, detecting completion with `strategy`.
    fn send_with(
        &mut self,
        command: &str,
        strategy: ReadStrategy,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Acquire a specific privilege level.
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if the driver is connected.
    fn is_open(&self) -> bool;

    /// Check if the underlying SSH session is still alive.
    fn is_alive(&self) -> bool;

    /// Get the current privilege level name.
    fn current_privilege(&self) -> Option<&str>;
}
