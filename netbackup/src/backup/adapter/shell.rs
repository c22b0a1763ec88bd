//! Interactive shell adapter over SSH.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use secrecy::{ExposeSecret, SecretString};

use super::Fetched;
use crate::backup::catalog::ShellKind;
use crate::backup::registry::DeviceRecord;
use crate::driver::{Driver, DriverBuilder, ReadStrategy};
use crate::error::FetchError;
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::HostKeyVerification;

/// Block written above every shell backup.
pub fn device_header(host: &str) -> String {
    format!(
        "####################################\n# Output for device {host}\n####################################\n\n"
    )
}

/// SSH connection settings shared by every shell device.
#[derive(Debug, Clone)]
pub struct ShellSettings {
    pub port: u16,
    /// Connect and per-read timeout.
    pub timeout: Duration,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            port: 22,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// One command to run on one device.
pub struct ShellRequest<'a> {
    pub host: &'a str,
    pub username: &'a str,
    pub password: &'a SecretString,
    pub platform: &'a PlatformDefinition,
    pub command: &'a str,
    pub read: ReadStrategy,
}

/// Execute a command over an interactive session and return the captured
/// text, echo and prompt removed.
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    async fn execute(&self, request: ShellRequest<'_>) -> Result<String, FetchError>;
}

/// [`ShellExecutor`] on top of the SSH driver.
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    settings: ShellSettings,
}

impl SshExecutor {
    pub fn new(settings: ShellSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ShellExecutor for SshExecutor {
    async fn execute(&self, request: ShellRequest<'_>) -> Result<String, FetchError> {
        let mut builder = DriverBuilder::new(request.host)
            .port(self.settings.port)
            .username(request.username)
            .password(request.password.expose_secret())
            .platform(request.platform.clone())
            .timeout(self.settings.timeout)
            .host_key_verification(self.settings.host_key_verification);
        if let Some(ref path) = self.settings.known_hosts_path {
            builder = builder.known_hosts_path(path.clone());
        }

        let mut driver = builder.build()?;
        driver.open().await?;

        let result = driver.send_with(request.command, request.read).await;

        if let Err(e) = driver.close().await {
            debug!("{}: error while disconnecting: {}", request.host, e);
        }

        let response = result?;
        if let Some(failure) = response.failure_message {
            return Err(FetchError::Protocol(format!(
                "'{}' rejected by device: {}",
                request.command, failure
            )));
        }

        debug!(
            "{}: '{}' returned {} bytes in {:?}",
            request.host,
            request.command,
            response.result.len(),
            response.elapsed
        );
        Ok(response.result)
    }
}

/// Runs the catalog command for shell device kinds.
pub struct ShellAdapter {
    executor: Arc<dyn ShellExecutor>,
    platforms: Arc<PlatformRegistry>,
}

impl ShellAdapter {
    pub fn new(executor: Arc<dyn ShellExecutor>, platforms: Arc<PlatformRegistry>) -> Self {
        Self {
            executor,
            platforms,
        }
    }

    pub(crate) async fn fetch(
        &self,
        record: &DeviceRecord,
        kind: &ShellKind,
        username: &str,
        password: &SecretString,
    ) -> Result<Fetched, FetchError> {
        let platform = self
            .platforms
            .require(&kind.platform)
            .map_err(|e| FetchError::Protocol(e.to_string()))?;

        info!(
            "{}: running '{}' on {} ({:?})",
            record.name, kind.command, record.host, kind.read
        );

        let output = self
            .executor
            .execute(ShellRequest {
                host: &record.host,
                username,
                password,
                platform,
                command: &kind.command,
                read: kind.read,
            })
            .await?;

        if output.trim().is_empty() {
            return Ok(Fetched::Empty);
        }

        let mut text = device_header(&record.host);
        text.push_str(&output);
        Ok(Fetched::Config(text))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::backup::catalog::{DeviceCatalog, DeviceKind};

    /// Records what it was asked to run and replies with a fixed result.
    struct FakeExecutor {
        reply: Mutex<Option<Result<String, FetchError>>>,
        seen: Mutex<Vec<(String, String, String, ReadStrategy)>>,
    }

    impl FakeExecutor {
        fn replying(reply: Result<String, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl ShellExecutor for FakeExecutor {
        async fn execute(&self, request: ShellRequest<'_>) -> Result<String, FetchError> {
            self.seen.lock().unwrap().push((
                request.host.to_string(),
                request.password.expose_secret().to_string(),
                request.platform.name.clone(),
                request.read,
            ));
            self.reply.lock().unwrap().take().unwrap()
        }
    }

    fn shell_kind(kind: &str) -> ShellKind {
        match DeviceCatalog::builtin().lookup(kind) {
            Some(DeviceKind::Shell(shell)) => shell,
            other => panic!("{kind} is not a shell kind: {other:?}"),
        }
    }

    fn adapter(executor: Arc<FakeExecutor>) -> ShellAdapter {
        ShellAdapter::new(executor, Arc::new(PlatformRegistry::with_builtins()))
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(
            device_header("10.0.0.1"),
            "####################################\n\
             # Output for device 10.0.0.1\n\
             ####################################\n\n"
        );
    }

    #[tokio::test]
    async fn test_prepends_header() {
        let executor = FakeExecutor::replying(Ok("/system identity\nset name=sw1\n".into()));
        let record = DeviceRecord::new("sw1", "10.0.0.1", "mikrotik_routeros", "MAIN_USER");
        let password = SecretString::from("s3cret".to_string());

        let fetched = adapter(executor.clone())
            .fetch(&record, &shell_kind("mikrotik_routeros"), "backup", &password)
            .await
            .unwrap();

        assert_eq!(
            fetched,
            Fetched::Config(format!(
                "{}/system identity\nset name=sw1\n",
                device_header("10.0.0.1")
            ))
        );

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].0, "10.0.0.1");
        assert_eq!(seen[0].1, "s3cret");
        assert_eq!(seen[0].2, "mikrotik_routeros");
        assert_eq!(
            seen[0].3,
            ReadStrategy::TimedDrain {
                last_read: Duration::from_secs(60)
            }
        );
    }

    #[tokio::test]
    async fn test_empty_output() {
        let executor = FakeExecutor::replying(Ok("\n".into()));
        let record = DeviceRecord::new("sw2", "10.0.0.2", "cisco_s300", "MAIN_USER");
        let password = SecretString::from(String::new());

        let fetched = adapter(executor)
            .fetch(&record, &shell_kind("cisco_s300"), "", &password)
            .await
            .unwrap();
        assert_eq!(fetched, Fetched::Empty);
    }

    #[tokio::test]
    async fn test_executor_error_passes_through() {
        let executor =
            FakeExecutor::replying(Err(FetchError::Authentication("rejected login".into())));
        let record = DeviceRecord::new("sw3", "10.0.0.3", "ubiquiti_edgeswitch", "MAIN_USER");
        let password = SecretString::from("wrong".to_string());

        let err = adapter(executor)
            .fetch(&record, &shell_kind("ubiquiti_edgeswitch"), "backup", &password)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_unknown_platform_is_protocol_error() {
        let executor = FakeExecutor::replying(Ok("unused".into()));
        let record = DeviceRecord::new("r1", "10.0.0.4", "vyos", "MAIN_USER");
        let kind = ShellKind {
            platform: "vyos".into(),
            command: "show configuration".into(),
            read: ReadStrategy::PromptSynchronized,
        };
        let password = SecretString::from(String::new());

        let err = adapter(executor)
            .fetch(&record, &kind, "backup", &password)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Protocol(_)));
    }
}
