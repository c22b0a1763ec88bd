//! Command execution over an open interactive shell.

use std::time::{Duration, Instant};

use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::ReadStrategy;
use super::privilege::PrivilegeManager;
use super::response::{Response, normalize_output};
use crate::channel::{PtyChannel, PtyConfig, ShellIo};
use crate::error::{ChannelError, DriverError, PlatformError, Result};
use crate::platform::PlatformDefinition;

/// Wait for a login banner before nudging the device with a return.
const BANNER_WAIT: Duration = Duration::from_secs(5);

/// Lines after the echo where a CLI reports a rejected command.
const REJECTION_LINES: usize = 2;

/// Failure string found where the CLI reports a rejection.
///
/// Only the first non-blank lines are checked: the rest is command output,
/// and a configuration may quote any failure string.
fn rejection(patterns: &[String], result: &str) -> Option<String> {
    result
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(REJECTION_LINES)
        .find_map(|line| patterns.iter().find(|p| line.contains(p.as_str())))
        .cloned()
}

/// A prepared shell: prompt known, privilege level tracked.
pub struct ShellSession<T> {
    channel: PtyChannel<T>,
    platform: PlatformDefinition,
    prompt: Regex,
    privileges: PrivilegeManager,
    secret: Option<SecretString>,
    timeout: Duration,
}

impl<T: ShellIo> ShellSession<T> {
    /// Wrap a freshly opened shell. Nothing is read until [`prepare`](Self::prepare).
    pub fn new(
        io: T,
        platform: PlatformDefinition,
        secret: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self> {
        platform.validate()?;
        let prompt = platform.combined_prompt()?;
        let channel = PtyChannel::new(
            io,
            PtyConfig {
                return_char: platform.return_char.clone(),
                ..PtyConfig::default()
            },
        );

        Ok(Self {
            channel,
            privileges: PrivilegeManager::new(platform.privilege_levels.clone()),
            platform,
            prompt,
            secret,
            timeout,
        })
    }

    /// Find the first prompt, move to the default privilege level and run
    /// the platform's session preparation commands.
    pub async fn prepare(&mut self) -> Result<()> {
        let data = match self
            .channel
            .read_until_pattern(&self.prompt, self.timeout.min(BANNER_WAIT))
            .await
        {
            Ok(data) => data,
            Err(crate::Error::Channel(ChannelError::PatternTimeout(_))) => {
                debug!("{}: no prompt after login, sending return", self.platform.name);
                self.channel.send("").await?;
                self.channel
                    .read_until_pattern(&self.prompt, self.timeout)
                    .await?
            }
            Err(e) => return Err(e),
        };

        let prompt = self.extract_prompt(&data);
        let level = self.privileges.update_from_prompt(&prompt)?;
        debug!("{}: logged in at '{}' ({})", self.platform.name, prompt, level);

        let target = self.platform.default_privilege.clone();
        self.acquire_privilege(&target).await?;

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if !response.is_success() {
                warn!(
                    "{}: session preparation '{}' rejected: {}",
                    self.platform.name,
                    command,
                    response.failure_message.unwrap_or_default()
                );
            }
        }

        Ok(())
    }

    /// Send a command and read until the prompt returns.
    pub async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        self.channel.send(command).await?;

        let data = self
            .channel
            .read_until_pattern(&self.prompt, self.timeout)
            .await?;

        Ok(self.build_response(command, &data, start))
    }

    /// Send a command and drain output until it has been quiet for `last_read`.
    pub async fn send_command_timing(
        &mut self,
        command: &str,
        last_read: Duration,
        budget: Duration,
    ) -> Result<Response> {
        let start = Instant::now();
        self.channel.send(command).await?;

        let data = self.channel.read_until_idle(last_read, budget).await?;

        Ok(self.build_response(command, &data, start))
    }

    /// Send a command using the given read strategy.
    pub async fn send_with(&mut self, command: &str, strategy: ReadStrategy) -> Result<Response> {
        match strategy {
            ReadStrategy::PromptSynchronized => self.send_command(command).await,
            ReadStrategy::TimedDrain { last_read } => {
                let budget = self.timeout.max(last_read * 4);
                self.send_command_timing(command, last_read, budget).await
            }
        }
    }

    /// Move to `target`, answering secret prompts with the enable secret.
    pub async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = self
            .privileges
            .current()
            .ok_or_else(|| DriverError::UnknownPrivilege {
                prompt: String::new(),
            })?
            .to_string();

        if current == target {
            return Ok(());
        }

        let path = self.privileges.find_path(&current, target)?;

        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);
            let transition = self.privileges.transition(from, to).ok_or_else(|| {
                DriverError::NoPrivilegePath {
                    from: from.clone(),
                    to: to.clone(),
                }
            })?;

            debug!("{}: {} -> {} via '{}'", self.platform.name, from, to, transition.command);
            self.channel.send(&transition.command).await?;

            let data = match transition.auth_prompt {
                Some(ref auth) => {
                    let either = Regex::new(&format!("(?:{})|(?:{})", auth.as_str(), self.prompt.as_str()))
                        .map_err(PlatformError::from)?;
                    let data = self.channel.read_until_pattern(&either, self.timeout).await?;

                    if self.prompt.is_match(&data) {
                        data
                    } else {
                        let secret = self
                            .secret
                            .as_ref()
                            .map(|s| s.expose_secret().to_string())
                            .unwrap_or_default();
                        self.channel.send(&secret).await?;
                        self.channel
                            .read_until_pattern(&self.prompt, self.timeout)
                            .await?
                    }
                }
                None => {
                    self.channel
                        .read_until_pattern(&self.prompt, self.timeout)
                        .await?
                }
            };

            let prompt = self.extract_prompt(&data);
            let reached = self.privileges.update_from_prompt(&prompt)?;
            if reached != *to {
                return Err(DriverError::PrivilegeAcquisitionFailed { target: to.clone() }.into());
            }
        }

        Ok(())
    }

    /// Send the platform's close commands and release the shell.
    pub async fn close(&mut self) -> Result<()> {
        for command in self.platform.on_close_commands.clone() {
            self.channel.send(&command).await?;
        }
        self.channel.shutdown().await
    }

    pub fn current_privilege(&self) -> Option<&str> {
        self.privileges.current()
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    fn extract_prompt(&self, data: &[u8]) -> String {
        match self.prompt.find(data) {
            Some(m) => String::from_utf8_lossy(&data[m.start()..]).trim().to_string(),
            None => String::new(),
        }
    }

    fn build_response(&mut self, command: &str, data: &[u8], start: Instant) -> Response {
        let raw = String::from_utf8_lossy(data).to_string();

        let prompt_match = self.prompt.find(data);
        let prompt = prompt_match
            .map(|m| String::from_utf8_lossy(&data[m.start()..]).trim().to_string())
            .unwrap_or_default();

        if !prompt.is_empty() {
            if let Err(e) = self.privileges.update_from_prompt(&prompt) {
                debug!("{}: {}", self.platform.name, e);
            }
        }

        // Lossy conversion may shift offsets; fall back to unstripped output
        let prompt_start = prompt_match
            .map(|m| m.start())
            .filter(|&s| raw.is_char_boundary(s) && raw.len() == data.len());

        let result = normalize_output(&raw, command, prompt_start);
        let response = Response::new(command, result, raw, prompt, start.elapsed());

        match rejection(&self.platform.failed_when_contains, &response.result) {
            Some(pattern) => response.with_failure(pattern),
            None => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ScriptedIo;
    use crate::platform::vendors::{cisco_s300, mikrotik_routeros, ubiquiti_edgeswitch};

    fn secret() -> Option<SecretString> {
        Some(SecretString::from("s3cret".to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_prepare_escalates_with_secret() {
        let io = ScriptedIo::new(vec![
            (10, "Welcome\r\n(UBNT EdgeSwitch) >"),
            (10, "enable\r\nPassword:"),
            (10, "\r\n(UBNT EdgeSwitch) #"),
            (10, "terminal length 0\r\n(UBNT EdgeSwitch) #"),
        ]);
        let written = io.written.clone();

        let mut session = ShellSession::new(
            io,
            ubiquiti_edgeswitch::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        session.prepare().await.unwrap();

        assert_eq!(session.current_privilege(), Some("privilege_exec"));
        let sent = String::from_utf8(written.lock().unwrap().clone()).unwrap();
        assert_eq!(sent, "enable\ns3cret\nterminal length 0\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_secret_fails_acquisition() {
        let io = ScriptedIo::new(vec![
            (10, "(UBNT EdgeSwitch) >"),
            (10, "enable\r\nPassword:"),
            (10, "\r\n% Access denied\r\n(UBNT EdgeSwitch) >"),
        ]);

        let mut session = ShellSession::new(
            io,
            ubiquiti_edgeswitch::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        let err = session.prepare().await.unwrap_err();

        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::PrivilegeAcquisitionFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_synchronized_command() {
        let io = ScriptedIo::new(vec![
            (10, "switch01#"),
            (10, "terminal datadump\r\nswitch01#"),
            (10, "terminal width 0\r\nswitch01#"),
            (10, "show run\r\nconfig-file-header\r\nhostname switch01\r\n"),
            (10, "!\r\nswitch01#"),
        ]);

        let mut session =
            ShellSession::new(io, cisco_s300::platform(), secret(), Duration::from_secs(10)).unwrap();
        session.prepare().await.unwrap();

        let response = session
            .send_with("show run", ReadStrategy::PromptSynchronized)
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.result, "config-file-header\nhostname switch01\n!\n");
        assert_eq!(response.prompt, "switch01#");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_drain_command() {
        let mut io = ScriptedIo::new(vec![
            (10, "[admin@MikroTik] > "),
            (50, "export\r\n"),
            (3000, "# jan/02/2024 12:00:00 by RouterOS 7.12\r\n"),
            (3000, "/system identity\r\nset name=MikroTik\r\n"),
            (10, "[admin@MikroTik] > "),
        ]);
        io.close_after = false;

        let mut session = ShellSession::new(
            io,
            mikrotik_routeros::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        session.prepare().await.unwrap();

        let response = session
            .send_with(
                "export",
                ReadStrategy::TimedDrain {
                    last_read: Duration::from_secs(5),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            response.result,
            "# jan/02/2024 12:00:00 by RouterOS 7.12\n/system identity\nset name=MikroTik\n"
        );
        assert_eq!(response.prompt, "[admin@MikroTik] >");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_pattern_marks_response() {
        let io = ScriptedIo::new(vec![
            (10, "[admin@MikroTik] > "),
            (10, "exprot\r\nbad command name exprot (line 1 column 1)\r\n[admin@MikroTik] > "),
        ]);

        let mut session = ShellSession::new(
            io,
            mikrotik_routeros::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        session.prepare().await.unwrap();

        let response = session.send_command("exprot").await.unwrap();
        assert_eq!(response.failure_message.as_deref(), Some("bad command name"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_string_inside_config_is_not_a_rejection() {
        let io = ScriptedIo::new(vec![
            (10, "[admin@MikroTik] > "),
            (
                10,
                "export\r\n# jan/02/2024 by RouterOS 7.12\r\n/system script\r\n\
                 add name=alert source=\":log error \\\"failure: uplink down\\\"\"\r\n\
                 [admin@MikroTik] > ",
            ),
        ]);

        let mut session = ShellSession::new(
            io,
            mikrotik_routeros::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        session.prepare().await.unwrap();

        let response = session.send_command("export").await.unwrap();
        assert!(response.is_success());
        assert!(response.result.contains("failure: uplink down"));
    }

    #[test]
    fn test_rejection_checks_leading_lines_only() {
        let patterns = vec!["% Invalid input".to_string(), "failure:".to_string()];

        assert_eq!(
            rejection(&patterns, "\n% Invalid input detected at '^' marker.\n"),
            Some("% Invalid input".to_string())
        );
        assert_eq!(
            rejection(&patterns, "hostname sw1\n!\ninterface gi1\n description failure: test\n"),
            None
        );
        assert_eq!(rejection(&patterns, ""), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_login_gets_a_return() {
        let mut io = ScriptedIo::new(vec![]);
        io.chunks.push_back((Duration::from_secs(6), b"\r\n[admin@MikroTik] > ".to_vec()));
        let written = io.written.clone();

        let mut session = ShellSession::new(
            io,
            mikrotik_routeros::platform(),
            secret(),
            Duration::from_secs(10),
        )
        .unwrap();
        session.prepare().await.unwrap();

        assert_eq!(written.lock().unwrap().as_slice(), b"\r\n");
    }
}
