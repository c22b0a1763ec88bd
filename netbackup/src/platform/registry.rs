//! Registry of platform definitions by name.

use indexmap::IndexMap;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::PlatformError;

/// Platform definitions available to the shell adapter.
///
/// Built once at startup and shared read-only with every worker.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: IndexMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in vendor definition.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::mikrotik_routeros::platform(),
            vendors::ubiquiti_edgeswitch::platform(),
            vendors::cisco_s300::platform(),
            vendors::generic::platform(),
        ] {
            registry.platforms.insert(platform.name.clone(), platform);
        }
        registry
    }

    /// Register an additional definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<(), PlatformError> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::InvalidDefinition {
                message: format!("platform '{}' is already registered", platform.name),
            });
        }
        platform.validate()?;
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Look up a platform, failing with [`PlatformError::UnknownPlatform`].
    pub fn require(&self, name: &str) -> Result<&PlatformDefinition, PlatformError> {
        self.get(name).ok_or_else(|| PlatformError::UnknownPlatform {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }
}
