//! Platform definition for vendor-specific CLI behaviour.

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::privilege_level::PrivilegeLevel;
use crate::error::PlatformError;

/// Everything the driver needs to know about one vendor's CLI.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name, e.g. `mikrotik_routeros`.
    pub name: String,

    /// Privilege levels, root first.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level to be in before running commands.
    pub default_privilege: String,

    /// Output substrings that mean the command was rejected.
    pub failed_when_contains: Vec<String>,

    /// Session preparation (paging off, terminal width...).
    pub on_open_commands: Vec<String>,

    /// Sent before disconnecting.
    pub on_close_commands: Vec<String>,

    /// Line terminator the CLI expects.
    pub return_char: String,

    /// Appended to the login name. RouterOS reads terminal options from it.
    pub username_suffix: Option<String>,

    pub terminal_width: u32,

    pub terminal_height: u32,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            return_char: "\n".to_string(),
            username_suffix: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    pub fn with_return_char(mut self, return_char: impl Into<String>) -> Self {
        self.return_char = return_char.into();
        self
    }

    pub fn with_username_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.username_suffix = Some(suffix.into());
        self
    }

    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// Login name as sent to the device.
    pub fn login_name(&self, username: &str) -> String {
        match self.username_suffix {
            Some(ref suffix) => format!("{username}{suffix}"),
            None => username.to_string(),
        }
    }

    /// One regex matching the prompt of any privilege level.
    pub fn combined_prompt(&self) -> Result<Regex, PlatformError> {
        if self.privilege_levels.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' has no privilege levels", self.name),
            });
        }

        let combined = self
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Regex::new(&combined)?)
    }

    /// Check internal consistency: default level and parents exist.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if !self.privilege_levels.contains_key(&self.default_privilege) {
            return Err(PlatformError::InvalidDefinition {
                message: format!(
                    "platform '{}' default privilege '{}' is not defined",
                    self.name, self.default_privilege
                ),
            });
        }

        for level in self.privilege_levels.values() {
            if let Some(ref parent) = level.parent {
                if !self.privilege_levels.contains_key(parent) {
                    return Err(PlatformError::InvalidDefinition {
                        message: format!(
                            "privilege '{}' has unknown parent '{}'",
                            level.name, parent
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
