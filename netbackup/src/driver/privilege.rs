//! Privilege level tracking and navigation.

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the current privilege level and plans moves between levels.
///
/// Levels form a tree through their `parent` links; a move climbs from the
/// current level to the closest common ancestor, then descends to the
/// target.
#[derive(Debug, Clone)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    current: Option<String>,
}

/// One step between adjacent levels.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Command to send.
    pub command: String,

    /// Secret prompt to expect, when escalating into a protected level.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeManager {
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        Self {
            levels,
            current: None,
        }
    }

    /// Level whose prompt pattern matches `prompt`.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Record the level matching `prompt` as current and return its name.
    pub fn update_from_prompt(&mut self, prompt: &str) -> Result<String> {
        let name = self.determine_from_prompt(prompt)?.name.clone();
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.levels.contains_key(name) {
            return Err(DriverError::UnknownPrivilege {
                prompt: name.to_string(),
            }
            .into());
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// `name` followed by its ancestors up to the root.
    fn lineage(&self, name: &str) -> Vec<String> {
        let mut chain = vec![];
        let mut next = Some(name.to_string());

        while let Some(level) = next {
            // Guard against parent cycles in hand-written definitions
            if chain.contains(&level) || !self.levels.contains_key(&level) {
                break;
            }
            next = self.levels[&level].parent.clone();
            chain.push(level);
        }

        chain
    }

    /// Levels to traverse from `from` to `to`, both included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || -> crate::Error {
            DriverError::NoPrivilegePath {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into()
        };

        if !self.levels.contains_key(from) || !self.levels.contains_key(to) {
            return Err(no_path());
        }

        let up = self.lineage(from);
        let down = self.lineage(to);

        let (up_idx, down_idx) = up
            .iter()
            .enumerate()
            .find_map(|(i, level)| down.iter().position(|d| d == level).map(|j| (i, j)))
            .ok_or_else(no_path)?;

        let mut path: Vec<String> = up[..=up_idx].to_vec();
        path.extend(down[..down_idx].iter().rev().cloned());
        Ok(path)
    }

    /// How to move between two adjacent levels.
    pub fn transition(&self, from: &str, to: &str) -> Option<Transition> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        if to_level.parent.as_deref() == Some(from) {
            return Some(Transition {
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.escalate_prompt.clone(),
            });
        }

        if from_level.parent.as_deref() == Some(to) {
            return Some(Transition {
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_s300;

    fn manager() -> PrivilegeManager {
        PrivilegeManager::new(cisco_s300::platform().privilege_levels)
    }

    #[test]
    fn test_determine_privilege() {
        let manager = manager();
        assert_eq!(manager.determine_from_prompt("sw1>").unwrap().name, "exec");
        assert_eq!(
            manager.determine_from_prompt("sw1#").unwrap().name,
            "privilege_exec"
        );
        assert_eq!(
            manager.determine_from_prompt("sw1(config)#").unwrap().name,
            "configuration"
        );
        assert!(manager.determine_from_prompt("login:").is_err());
    }

    #[test]
    fn test_find_path() {
        let manager = manager();
        assert_eq!(
            manager.find_path("exec", "configuration").unwrap(),
            vec!["exec", "privilege_exec", "configuration"]
        );
        assert_eq!(
            manager.find_path("configuration", "exec").unwrap(),
            vec!["configuration", "privilege_exec", "exec"]
        );
        assert_eq!(manager.find_path("exec", "exec").unwrap(), vec!["exec"]);
        assert!(manager.find_path("exec", "shell").is_err());
    }

    #[test]
    fn test_transition() {
        let manager = manager();

        let up = manager.transition("exec", "privilege_exec").unwrap();
        assert_eq!(up.command, "enable");
        assert!(up.auth_prompt.is_some());

        let down = manager.transition("privilege_exec", "exec").unwrap();
        assert_eq!(down.command, "disable");
        assert!(down.auth_prompt.is_none());

        assert!(manager.transition("exec", "configuration").is_none());
    }

    #[test]
    fn test_update_from_prompt() {
        let mut manager = manager();
        assert!(manager.current().is_none());
        assert_eq!(manager.update_from_prompt("sw1>").unwrap(), "exec");
        assert_eq!(manager.current(), Some("exec"));
    }
}
