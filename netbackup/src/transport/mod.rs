//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host key policy and PTY channel
//! creation for the interactive shell channel.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
