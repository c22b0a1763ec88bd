//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{PlatformError, Result};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use netbackup::driver::{Driver, DriverBuilder};
/// use netbackup::platform::PlatformRegistry;
///
/// # async fn example() -> Result<(), netbackup::Error> {
/// let registry = PlatformRegistry::with_builtins();
/// let mut driver = DriverBuilder::new("192.0.2.10")
///     .username("backup")
///     .password("secret")
///     .platform(registry.require("cisco_s300")?.clone())
///     .build()?;
/// driver.open().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: Option<AuthMethod>,
    enable_secret: Option<SecretString>,
    platform: Option<PlatformDefinition>,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: None,
            enable_secret: None,
            platform: None,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password authentication. The password doubles as enable secret
    /// unless [`enable_secret`](Self::enable_secret) is set.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = Some(AuthMethod::Password(SecretString::from(password.into())));
        self
    }

    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = Some(AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        });
        self
    }

    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Platform definition, usually taken from a [`PlatformRegistry`].
    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Look the platform up by name.
    pub fn platform_named(mut self, registry: &PlatformRegistry, name: &str) -> Result<Self> {
        self.platform = Some(registry.require(name)?.clone());
        Ok(self)
    }

    /// Connect and per-read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `open()` on the
    /// returned driver to establish the connection.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| PlatformError::InvalidDefinition {
            message: "username is required".to_string(),
        })?;

        let auth = self.auth.ok_or_else(|| PlatformError::InvalidDefinition {
            message: "an authentication method is required".to_string(),
        })?;

        let platform = self.platform.ok_or_else(|| PlatformError::InvalidDefinition {
            message: "platform must be specified".to_string(),
        })?;
        platform.validate()?;

        let enable_secret = match (self.enable_secret, &auth) {
            (Some(secret), _) => Some(secret),
            (None, AuthMethod::Password(password)) => Some(password.clone()),
            (None, AuthMethod::PrivateKey { .. }) => None,
        };

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username: platform.login_name(&username),
            auth,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        Ok(GenericDriver::new(ssh_config, platform, enable_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;
    use crate::platform::vendors::mikrotik_routeros;

    #[test]
    fn test_build_requires_platform() {
        let result = DriverBuilder::new("192.0.2.1")
            .username("admin")
            .password("secret")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_requires_username() {
        let result = DriverBuilder::new("192.0.2.1")
            .password("secret")
            .platform(mikrotik_routeros::platform())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_applies_login_suffix() {
        let driver = DriverBuilder::new("192.0.2.1")
            .username("backup")
            .password("secret")
            .platform(mikrotik_routeros::platform())
            .build()
            .unwrap();

        assert_eq!(driver.host(), "192.0.2.1");
        assert_eq!(driver.ssh_config().username, "backup+ct511w4098h");
        assert_eq!(driver.ssh_config().terminal_height, 4098);
        assert!(!driver.is_open());
        assert!(!driver.is_alive());
    }

    #[test]
    fn test_platform_named_unknown() {
        let registry = PlatformRegistry::with_builtins();
        assert!(
            DriverBuilder::new("192.0.2.1")
                .platform_named(&registry, "nokia_sros")
                .is_err()
        );
    }
}
