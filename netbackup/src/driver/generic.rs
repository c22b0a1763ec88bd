//! Generic driver implementation that works with any platform.

use log::{debug, warn};
use russh::Channel;
use russh::client::Msg;
use secrecy::SecretString;

use super::session::ShellSession;
use super::{Driver, ReadStrategy, Response};
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::SshTransport;
use crate::transport::config::SshConfig;

/// Driver over a real SSH connection for any platform definition.
///
/// Owns the transport and a [`ShellSession`] on its interactive channel.
pub struct GenericDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    enable_secret: Option<SecretString>,
    transport: Option<SshTransport>,
    session: Option<ShellSession<Channel<Msg>>>,
}

impl GenericDriver {
    /// Create a driver. Nothing is connected until [`Driver::open`].
    pub fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        enable_secret: Option<SecretString>,
    ) -> Self {
        Self {
            ssh_config,
            platform,
            enable_secret,
            transport: None,
            session: None,
        }
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    fn session_mut(&mut self) -> Result<&mut ShellSession<Channel<Msg>>> {
        self.session
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        debug!(
            "connecting to {} as '{}' ({})",
            self.ssh_config.socket_addr(),
            self.ssh_config.username,
            self.platform.name
        );

        let transport = SshTransport::connect(self.ssh_config.clone()).await?;
        let channel = transport.open_channel().await?;

        let mut session = ShellSession::new(
            channel,
            self.platform.clone(),
            self.enable_secret.clone(),
            self.ssh_config.timeout,
        )?;

        // Keep the transport so a failed preparation still disconnects cleanly
        self.transport = Some(transport);

        if let Err(e) = session.prepare().await {
            if let Some(transport) = self.transport.take() {
                let _ = transport.close().await;
            }
            return Err(e);
        }

        self.session = Some(session);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("{}: error leaving shell: {}", self.ssh_config.host, e);
            }
        }

        match self.transport.take() {
            Some(transport) => transport.close().await,
            None => Ok(()),
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        self.session_mut()?.send_command(command).await
    }

    async fn send_with(&mut self, command: &str, strategy: ReadStrategy) -> Result<Response> {
        self.session_mut()?.send_with(command, strategy).await
    }

    async fn acquire_privilege(&mut self, privilege: &str) -> Result<()> {
        self.session_mut()?.acquire_privilege(privilege).await
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_alive())
    }

    fn current_privilege(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.current_privilege())
    }
}
