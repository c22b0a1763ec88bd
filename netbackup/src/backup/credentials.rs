//! Maps a record's credential reference to secret material.

use std::sync::Arc;

use log::warn;
use secrecy::SecretString;

use super::catalog::ChannelGroup;
use super::registry::ClassifiedDevice;
use crate::error::CredentialError;
use crate::secrets::{MAIN_PASS, MAIN_USER, SecretStore};

/// Secret material for one device.
#[derive(Clone)]
pub enum Credential {
    /// Shell login. The password doubles as the enable secret.
    Login {
        username: String,
        password: SecretString,
    },
    /// HTTP API token.
    Token(SecretString),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Token(_) => f.write_str("Token(..)"),
        }
    }
}

/// Pure lookup against an already loaded [`SecretStore`].
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    secrets: Arc<SecretStore>,
    strict: bool,
}

impl CredentialResolver {
    /// With `strict`, unknown shell references are errors instead of empty
    /// logins.
    pub fn new(secrets: Arc<SecretStore>, strict: bool) -> Self {
        Self { secrets, strict }
    }

    pub fn resolve(&self, device: &ClassifiedDevice) -> Result<Credential, CredentialError> {
        let reference = device.record.credential_ref.as_str();

        match device.group() {
            ChannelGroup::InteractiveShell => self.resolve_login(device.name(), reference),
            ChannelGroup::HttpApi => self
                .secrets
                .get(reference)
                .cloned()
                .map(Credential::Token)
                .ok_or_else(|| CredentialError::MissingSecret {
                    key: reference.to_string(),
                }),
        }
    }

    fn resolve_login(&self, device: &str, reference: &str) -> Result<Credential, CredentialError> {
        if reference == MAIN_USER {
            let username = self.secrets.value(MAIN_USER).ok_or_else(|| {
                CredentialError::MissingSecret {
                    key: MAIN_USER.to_string(),
                }
            })?;
            let password = self.secrets.get(MAIN_PASS).cloned().ok_or_else(|| {
                CredentialError::MissingSecret {
                    key: MAIN_PASS.to_string(),
                }
            })?;

            return Ok(Credential::Login {
                username: username.to_string(),
                password,
            });
        }

        if self.strict {
            return Err(CredentialError::UnknownReference {
                reference: reference.to_string(),
            });
        }

        warn!("{device}: unknown credential reference '{reference}', logging in with empty credentials");
        Ok(Credential::Login {
            username: String::new(),
            password: SecretString::from(String::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::backup::catalog::DeviceCatalog;
    use crate::backup::registry::{DeviceRecord, DeviceRegistry};

    fn device(kind: &str, reference: &str) -> ClassifiedDevice {
        DeviceRegistry::new(Arc::new(DeviceCatalog::builtin()))
            .classify(DeviceRecord::new("dev1", "10.0.0.1", kind, reference))
            .unwrap()
    }

    fn secrets() -> Arc<SecretStore> {
        Arc::new(SecretStore::from_pairs([
            (MAIN_USER, "backup"),
            (MAIN_PASS, "s3cret"),
            ("FORTI_TOKEN", "tok-123"),
        ]))
    }

    #[test]
    fn test_main_user_login() {
        let resolver = CredentialResolver::new(secrets(), false);
        match resolver.resolve(&device("cisco_s300", MAIN_USER)).unwrap() {
            Credential::Login { username, password } => {
                assert_eq!(username, "backup");
                assert_eq!(password.expose_secret(), "s3cret");
            }
            other => panic!("expected login, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_shell_reference_is_empty_login() {
        let resolver = CredentialResolver::new(secrets(), false);
        match resolver.resolve(&device("cisco_s300", "OTHER_USER")).unwrap() {
            Credential::Login { username, password } => {
                assert!(username.is_empty());
                assert!(password.expose_secret().is_empty());
            }
            other => panic!("expected login, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_shell_reference_strict() {
        let resolver = CredentialResolver::new(secrets(), true);
        let err = resolver
            .resolve(&device("cisco_s300", "OTHER_USER"))
            .unwrap_err();
        assert_eq!(
            err,
            CredentialError::UnknownReference {
                reference: "OTHER_USER".into()
            }
        );
    }

    #[test]
    fn test_http_token() {
        let resolver = CredentialResolver::new(secrets(), false);
        match resolver.resolve(&device("fortinet", "FORTI_TOKEN")).unwrap() {
            Credential::Token(token) => assert_eq!(token.expose_secret(), "tok-123"),
            other => panic!("expected token, got {other:?}"),
        }

        let err = resolver
            .resolve(&device("fortinet", "MISSING_TOKEN"))
            .unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingSecret {
                key: "MISSING_TOKEN".into()
            }
        );
    }

    #[test]
    fn test_main_user_without_password() {
        let resolver =
            CredentialResolver::new(Arc::new(SecretStore::from_pairs([(MAIN_USER, "backup")])), false);
        assert!(matches!(
            resolver.resolve(&device("cisco_s300", MAIN_USER)),
            Err(CredentialError::MissingSecret { key }) if key == MAIN_PASS
        ));
    }

    #[test]
    fn test_debug_redacts() {
        let credential = Credential::Token(SecretString::from("tok-123".to_string()));
        assert!(!format!("{credential:?}").contains("tok-123"));
    }
}
