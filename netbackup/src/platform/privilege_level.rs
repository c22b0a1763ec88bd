//! Privilege level definition.

use regex::bytes::Regex;

/// A CLI privilege level (user exec, privileged exec, configuration...).
///
/// Levels form a tree: each level names its parent and the commands that move
/// between the two.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this level, e.g. `exec` or `privilege_exec`.
    pub name: String,

    /// Prompt pattern for this level.
    pub pattern: Regex,

    /// Parent level, `None` for the level a login lands on.
    pub parent: Option<String>,

    /// Command that enters this level from the parent.
    pub escalate_command: Option<String>,

    /// Command that leaves this level for the parent.
    pub deescalate_command: Option<String>,

    /// Secret prompt shown after `escalate_command`, answered with the
    /// login password.
    pub escalate_prompt: Option<Regex>,

    /// Prompt substrings that rule this level out (`#` is also the last
    /// character of a config-mode prompt).
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            parent: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Escalation asks for a secret matching `prompt_pattern`.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Whether `prompt` belongs to this level.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_contains_rules_out_config_prompt() {
        let level = PrivilegeLevel::new("privilege_exec", r"#\s*$")
            .unwrap()
            .with_not_contains("(config");

        assert!(level.matches("switch#"));
        assert!(!level.matches("switch(config)#"));
    }

    #[test]
    fn test_builder_sets_transition() {
        let level = PrivilegeLevel::new("privilege_exec", r"#\s*$")
            .unwrap()
            .with_parent("exec")
            .with_escalate("enable")
            .with_deescalate("disable")
            .with_auth(r"[Pp]assword:\s*$")
            .unwrap();

        assert_eq!(level.parent.as_deref(), Some("exec"));
        assert_eq!(level.escalate_command.as_deref(), Some("enable"));
        assert_eq!(level.deescalate_command.as_deref(), Some("disable"));
        assert!(level.escalate_prompt.is_some());
    }
}
