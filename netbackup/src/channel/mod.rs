//! Channel layer for interactive sessions.
//!
//! Output accumulation with ANSI stripping, prompt detection on the buffer
//! tail, and the two read strategies used by the shell adapter.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig, ShellIo};

#[cfg(test)]
pub(crate) use pty::tests::ScriptedIo;
