//! Device kinds and how to back each of them up.
//!
//! The catalog maps a `device_kind` tag from the inventory to either a shell
//! recipe (platform, command, read strategy) or an HTTP recipe (scheme and
//! path template). It is built once at startup, checked for kinds listed in
//! both groups, and shared read-only by every worker.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::driver::ReadStrategy;
use crate::error::CatalogError;
use crate::platform::PlatformRegistry;

/// Settling window used by RouterOS `export`.
pub const ROUTEROS_LAST_READ: Duration = Duration::from_secs(60);

/// Path template for FortiGate configuration backups; the token is appended.
pub const FORTINET_BACKUP_PATH: &str =
    "/api/v2/monitor/system/config/backup?scope=global&access_token=";

/// Which adapter serves a device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelGroup {
    InteractiveShell,
    HttpApi,
}

impl std::fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InteractiveShell => f.write_str("shell"),
            Self::HttpApi => f.write_str("http"),
        }
    }
}

/// Shell recipe for one device kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellKind {
    /// Platform definition name in the [`PlatformRegistry`].
    pub platform: String,
    pub command: String,
    pub read: ReadStrategy,
}

/// HTTP recipe for one device kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpKind {
    pub scheme: String,
    /// Appended to the host; the token is appended to this.
    pub path: String,
}

/// A catalog entry, resolved for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    Shell(ShellKind),
    Http(HttpKind),
}

impl DeviceKind {
    pub fn group(&self) -> ChannelGroup {
        match self {
            Self::Shell(_) => ChannelGroup::InteractiveShell,
            Self::Http(_) => ChannelGroup::HttpApi,
        }
    }
}

/// Known device kinds, split by channel group.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    shell: IndexMap<String, ShellKind>,
    http: IndexMap<String, HttpKind>,
}

impl DeviceCatalog {
    /// Build a catalog, rejecting kinds that appear in both groups.
    pub fn new(
        shell: IndexMap<String, ShellKind>,
        http: IndexMap<String, HttpKind>,
    ) -> Result<Self, CatalogError> {
        if let Some(kind) = shell.keys().find(|kind| http.contains_key(*kind)) {
            return Err(CatalogError::AmbiguousKind { kind: kind.clone() });
        }
        Ok(Self { shell, http })
    }

    /// The supported vendors out of the box.
    pub fn builtin() -> Self {
        let mut shell = IndexMap::new();
        shell.insert(
            "mikrotik_routeros".to_string(),
            ShellKind {
                platform: "mikrotik_routeros".to_string(),
                command: "export".to_string(),
                read: ReadStrategy::TimedDrain {
                    last_read: ROUTEROS_LAST_READ,
                },
            },
        );
        for kind in ["ubiquiti_edgeswitch", "cisco_s300"] {
            shell.insert(
                kind.to_string(),
                ShellKind {
                    platform: kind.to_string(),
                    command: "show run".to_string(),
                    read: ReadStrategy::PromptSynchronized,
                },
            );
        }

        let mut http = IndexMap::new();
        http.insert(
            "fortinet".to_string(),
            HttpKind {
                scheme: "https".to_string(),
                path: FORTINET_BACKUP_PATH.to_string(),
            },
        );

        Self { shell, http }
    }

    /// Parse a YAML catalog.
    ///
    /// ```yaml
    /// shell:
    ///   mikrotik_routeros:
    ///     command: export
    ///     read: timed
    ///     last_read_secs: 60
    ///   cisco_s300:
    ///     command: show run
    /// http:
    ///   fortinet:
    ///     path: /api/v2/monitor/system/config/backup?scope=global&access_token=
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text)?;

        let shell = file
            .shell
            .into_iter()
            .map(|(kind, entry)| {
                let read = match entry.read {
                    ReadMode::Prompt => ReadStrategy::PromptSynchronized,
                    ReadMode::Timed => ReadStrategy::TimedDrain {
                        last_read: entry
                            .last_read_secs
                            .map(Duration::from_secs)
                            .unwrap_or(ROUTEROS_LAST_READ),
                    },
                };
                let platform = entry.platform.unwrap_or_else(|| kind.clone());
                (
                    kind,
                    ShellKind {
                        platform,
                        command: entry.command,
                        read,
                    },
                )
            })
            .collect();

        let http = file
            .http
            .into_iter()
            .map(|(kind, entry)| {
                (
                    kind,
                    HttpKind {
                        scheme: entry.scheme.unwrap_or_else(|| "https".to_string()),
                        path: entry.path,
                    },
                )
            })
            .collect();

        Self::new(shell, http)
    }

    /// Read and parse a YAML catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Check that every shell kind names a registered platform.
    pub fn check_platforms(&self, platforms: &PlatformRegistry) -> Result<(), CatalogError> {
        for (kind, shell) in &self.shell {
            if !platforms.contains(&shell.platform) {
                return Err(CatalogError::UnknownPlatform {
                    kind: kind.clone(),
                    platform: shell.platform.clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve a kind tag. `None` for unknown and empty tags.
    pub fn lookup(&self, kind: &str) -> Option<DeviceKind> {
        if let Some(shell) = self.shell.get(kind) {
            return Some(DeviceKind::Shell(shell.clone()));
        }
        self.http.get(kind).map(|http| DeviceKind::Http(http.clone()))
    }

    pub fn group(&self, kind: &str) -> Option<ChannelGroup> {
        if self.shell.contains_key(kind) {
            Some(ChannelGroup::InteractiveShell)
        } else if self.http.contains_key(kind) {
            Some(ChannelGroup::HttpApi)
        } else {
            None
        }
    }

    /// All known kind tags, shell kinds first.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.shell.keys().chain(self.http.keys()).map(String::as_str)
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    shell: IndexMap<String, ShellEntry>,
    #[serde(default)]
    http: IndexMap<String, HttpEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShellEntry {
    command: String,
    #[serde(default)]
    read: ReadMode,
    last_read_secs: Option<u64>,
    platform: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReadMode {
    #[default]
    Prompt,
    Timed,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HttpEntry {
    path: String,
    scheme: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_groups() {
        let catalog = DeviceCatalog::builtin();
        assert_eq!(
            catalog.group("mikrotik_routeros"),
            Some(ChannelGroup::InteractiveShell)
        );
        assert_eq!(catalog.group("cisco_s300"), Some(ChannelGroup::InteractiveShell));
        assert_eq!(catalog.group("fortinet"), Some(ChannelGroup::HttpApi));
        assert_eq!(catalog.group("juniper_junos"), None);
        assert_eq!(catalog.group(""), None);
    }

    #[test]
    fn test_builtin_recipes() {
        let catalog = DeviceCatalog::builtin();

        let Some(DeviceKind::Shell(routeros)) = catalog.lookup("mikrotik_routeros") else {
            panic!("routeros is a shell kind");
        };
        assert_eq!(routeros.command, "export");
        assert_eq!(
            routeros.read,
            ReadStrategy::TimedDrain {
                last_read: Duration::from_secs(60)
            }
        );

        let Some(DeviceKind::Shell(edgeswitch)) = catalog.lookup("ubiquiti_edgeswitch") else {
            panic!("edgeswitch is a shell kind");
        };
        assert_eq!(edgeswitch.command, "show run");
        assert_eq!(edgeswitch.read, ReadStrategy::PromptSynchronized);

        let Some(DeviceKind::Http(fortinet)) = catalog.lookup("fortinet") else {
            panic!("fortinet is an http kind");
        };
        assert_eq!(fortinet.scheme, "https");
        assert_eq!(fortinet.path, FORTINET_BACKUP_PATH);
    }

    #[test]
    fn test_builtin_platforms_exist() {
        let catalog = DeviceCatalog::builtin();
        assert!(catalog.check_platforms(&PlatformRegistry::with_builtins()).is_ok());
    }

    #[test]
    fn test_ambiguous_kind_rejected() {
        let yaml = r#"
shell:
  fortinet:
    command: show full-configuration
    platform: generic
http:
  fortinet:
    path: /api/backup?token=
"#;
        let err = DeviceCatalog::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, CatalogError::AmbiguousKind { kind } if kind == "fortinet"));
    }

    #[test]
    fn test_yaml_defaults() {
        let yaml = r#"
shell:
  mikrotik_routeros:
    command: export verbose
    read: timed
  cisco_s300:
    command: show startup-config
http:
  fortinet:
    path: /api/v2/backup?access_token=
    scheme: http
"#;
        let catalog = DeviceCatalog::from_yaml(yaml).unwrap();

        let Some(DeviceKind::Shell(routeros)) = catalog.lookup("mikrotik_routeros") else {
            panic!("routeros is a shell kind");
        };
        assert_eq!(routeros.platform, "mikrotik_routeros");
        assert_eq!(
            routeros.read,
            ReadStrategy::TimedDrain {
                last_read: ROUTEROS_LAST_READ
            }
        );

        let Some(DeviceKind::Shell(cisco)) = catalog.lookup("cisco_s300") else {
            panic!("cisco is a shell kind");
        };
        assert_eq!(cisco.read, ReadStrategy::PromptSynchronized);

        let Some(DeviceKind::Http(fortinet)) = catalog.lookup("fortinet") else {
            panic!("fortinet is an http kind");
        };
        assert_eq!(fortinet.scheme, "http");
    }

    #[test]
    fn test_unknown_platform_reported() {
        let yaml = "shell:\n  vyos:\n    command: show configuration\n";
        let catalog = DeviceCatalog::from_yaml(yaml).unwrap();
        let err = catalog
            .check_platforms(&PlatformRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPlatform { kind, .. } if kind == "vyos"));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            DeviceCatalog::from_yaml("shell:\n  x:\n    read: prompt\n"),
            Err(CatalogError::Parse(_))
        ));
    }
}
