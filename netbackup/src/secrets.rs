//! Key-value secrets loaded from an env-style file.
//!
//! Lines are parsed with `dotenvy` but never exported into the process
//! environment; everything downstream reads from the [`SecretStore`].

use std::path::Path;

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};

use crate::error::SecretsError;

/// Organisation label used in the report and mail subject.
pub const ORG: &str = "ORG";
pub const MAIN_USER: &str = "MAIN_USER";
pub const MAIN_PASS: &str = "MAIN_PASS";

/// Read-only secret entries for one run.
#[derive(Default)]
pub struct SecretStore {
    entries: IndexMap<String, SecretString>,
}

impl SecretStore {
    /// Load an env file. Later duplicates win, as with a shell `source`.
    ///
    /// Each line goes through `dotenvy`. Lines it rejects (an unquoted value
    /// with spaces, like `ORG=Example Corp`) are read as a plain
    /// `KEY=VALUE`, up to an inline ` #` comment.
    pub fn load(path: &Path) -> Result<Self, SecretsError> {
        let load_err = |source| SecretsError::Load {
            path: path.to_path_buf(),
            source,
        };

        let text = std::fs::read_to_string(path).map_err(|e| load_err(dotenvy::Error::Io(e)))?;

        let mut entries = IndexMap::new();
        for line in text.lines() {
            if let Some((key, value)) = parse_line(line).map_err(load_err)? {
                entries.insert(key, SecretString::from(value));
            }
        }

        Ok(Self { entries })
    }

    /// Build a store from literal pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), SecretString::from(v.into())))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.entries.get(key)
    }

    /// Look up an entry that must be present.
    pub fn require(&self, key: &str) -> Result<&SecretString, SecretsError> {
        self.get(key).ok_or_else(|| SecretsError::Missing {
            key: key.to_string(),
        })
    }

    /// Non-secret value (org label, SMTP host...) as plain text.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| v.expose_secret())
    }

    pub fn require_value(&self, key: &str) -> Result<&str, SecretsError> {
        self.require(key).map(|v| v.expose_secret())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One entry, `None` for blank and comment lines.
fn parse_line(line: &str) -> Result<Option<(String, String)>, dotenvy::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    match dotenvy::from_read_iter(trimmed.as_bytes()).next() {
        None => Ok(None),
        Some(Ok(entry)) => Ok(Some(entry)),
        Some(Err(err @ dotenvy::Error::LineParse(..))) => plain_entry(trimmed).map(Some).ok_or(err),
        Some(Err(err)) => Err(err),
    }
}

fn plain_entry(line: &str) -> Option<(String, String)> {
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid_key {
        return None;
    }

    let value = match value.find(" #") {
        Some(comment) => &value[..comment],
        None => value,
    };
    Some((key.to_string(), value.trim().to_string()))
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# netbackup secrets").unwrap();
        writeln!(file, "ORG=Example Corp").unwrap();
        writeln!(file, "MAIN_USER=backup").unwrap();
        writeln!(file, "MAIN_PASS='p@ss;word'").unwrap();
        writeln!(file, "FORTI_TOKEN=abc123").unwrap();

        let store = SecretStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.value(ORG), Some("Example Corp"));
        assert_eq!(store.require_value(MAIN_PASS).unwrap(), "p@ss;word");
        assert_eq!(store.value("FORTI_TOKEN"), Some("abc123"));
    }

    #[test]
    fn test_unquoted_values_with_spaces() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ORG=Example Corp  # shown in the report").unwrap();
        writeln!(file, "export SMTP_FROM=Netbackup Robot <netbackup@example.com>").unwrap();
        writeln!(file, "SMTP_TO=noc@example.com, ops@example.com").unwrap();
        writeln!(file, "MAIN_USER=\"backup\"").unwrap();

        let store = SecretStore::load(file.path()).unwrap();
        assert_eq!(store.value(ORG), Some("Example Corp"));
        assert_eq!(
            store.value("SMTP_FROM"),
            Some("Netbackup Robot <netbackup@example.com>")
        );
        assert_eq!(store.value("SMTP_TO"), Some("noc@example.com, ops@example.com"));
        assert_eq!(store.value(MAIN_USER), Some("backup"));
    }

    #[test]
    fn test_line_without_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ORG=Example").unwrap();
        writeln!(file, "this is not an entry").unwrap();

        let err = SecretStore::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            SecretsError::Load {
                source: dotenvy::Error::LineParse(..),
                ..
            }
        ));
    }

    #[test]
    fn test_load_does_not_touch_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NETBACKUP_TEST_ONLY_KEY=1").unwrap();

        SecretStore::load(file.path()).unwrap();
        assert!(std::env::var("NETBACKUP_TEST_ONLY_KEY").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = SecretStore::load(Path::new("/nonexistent/netbackup.env")).unwrap_err();
        assert!(matches!(err, SecretsError::Load { .. }));
    }

    #[test]
    fn test_require_missing() {
        let store = SecretStore::from_pairs([(ORG, "Example")]);
        assert!(matches!(
            store.require(MAIN_USER),
            Err(SecretsError::Missing { key }) if key == MAIN_USER
        ));
    }

    #[test]
    fn test_debug_hides_values() {
        let store = SecretStore::from_pairs([(MAIN_PASS, "hunter2")]);
        let debug = format!("{store:?}");
        assert!(debug.contains(MAIN_PASS));
        assert!(!debug.contains("hunter2"));
    }
}
