//! Platform definitions for multi-vendor support.
//!
//! Prompt patterns, privilege levels, failure strings and session
//! preparation for each supported CLI.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
