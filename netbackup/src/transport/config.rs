//! SSH connection configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys.
    Strict,

    /// Accept and learn unknown keys, reject changed keys.
    AcceptNew,

    /// Accept all keys without checking.
    ///
    /// Default for backup runs: switches and firewalls regenerate keys on
    /// reset and are rarely present in known_hosts.
    #[default]
    Disabled,
}

impl FromStr for HostKeyVerification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "yes" => Ok(Self::Strict),
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "disabled" | "no" | "off" => Ok(Self::Disabled),
            other => Err(format!("unknown host key checking mode '{other}'")),
        }
    }
}

/// SSH connection configuration.
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Connect and per-read timeout.
    pub timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file, `None` for the user default.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Create a config for `host` with defaults for everything but credentials.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            timeout: Duration::from_secs(30),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication method for SSH connections.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key authentication.
    PrivateKey {
        /// Path to the private key file.
        path: PathBuf,
        /// Optional passphrase for encrypted keys.
        passphrase: Option<SecretString>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_verification_from_str() {
        assert_eq!(
            "strict".parse::<HostKeyVerification>().unwrap(),
            HostKeyVerification::Strict
        );
        assert_eq!(
            "accept-new".parse::<HostKeyVerification>().unwrap(),
            HostKeyVerification::AcceptNew
        );
        assert_eq!(
            "no".parse::<HostKeyVerification>().unwrap(),
            HostKeyVerification::Disabled
        );
        assert!("sometimes".parse::<HostKeyVerification>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = SshConfig::new(
            "10.0.0.1",
            "admin",
            AuthMethod::Password(SecretString::from("pw".to_string())),
        );
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert_eq!(config.host_key_verification, HostKeyVerification::Disabled);
    }
}
