//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::backup::{HttpSettings, RunSettings, ShellSettings, ValidationPolicy};
use crate::transport::HostKeyVerification;

/// Back up network device configurations over SSH and HTTP APIs.
#[derive(Debug, Parser)]
#[command(name = "netbackup", version, about)]
pub struct Cli {
    /// Log directory, like '/home/user/logs/'
    #[arg(short = 'l', long = "log")]
    pub log: PathBuf,

    /// Backup root directory, like '/home/user/backups/'
    #[arg(short = 'b', long = "bck")]
    pub bck: PathBuf,

    /// Device inventory (';'-delimited), like '/home/user/devices.csv'
    #[arg(short = 'c', long = "csv")]
    pub csv: PathBuf,

    /// Secrets file, like '/home/user/.env'
    #[arg(short = 'e', long = "env")]
    pub env: PathBuf,

    /// Report template, like '/home/user/report.j2'
    #[arg(short = 'r', long = "rep")]
    pub rep: PathBuf,

    /// YAML device catalog replacing the built-in device kinds
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Devices backed up at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Seconds allowed for one device
    #[arg(long, default_value_t = 600)]
    pub device_timeout: u64,

    /// Seconds allowed for the whole run
    #[arg(long)]
    pub run_timeout: Option<u64>,

    /// Skip invalid inventory rows instead of stopping at the first one
    #[arg(long)]
    pub skip_invalid: bool,

    /// Fail shell devices whose credential reference is unknown
    #[arg(long)]
    pub strict_credentials: bool,

    /// Validate HTTPS certificates of API devices
    #[arg(long)]
    pub verify_tls: bool,

    /// Mark API devices NOT_OK on non-success HTTP statuses
    #[arg(long)]
    pub reject_http_errors: bool,

    /// SSH port for shell devices
    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    /// SSH host key checking: strict, accept-new or disabled
    #[arg(long, default_value = "disabled")]
    pub host_key_checking: HostKeyVerification,

    /// known_hosts file used when host key checking is enabled
    #[arg(long)]
    pub known_hosts: Option<PathBuf>,
}

impl Cli {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            concurrency: usize::from(self.concurrency),
            device_timeout: Duration::from_secs(self.device_timeout),
            run_timeout: self.run_timeout.map(Duration::from_secs),
            validation: if self.skip_invalid {
                ValidationPolicy::SkipInvalid
            } else {
                ValidationPolicy::FailFast
            },
        }
    }

    pub fn shell_settings(&self) -> ShellSettings {
        ShellSettings {
            port: self.ssh_port,
            host_key_verification: self.host_key_checking,
            known_hosts_path: self.known_hosts.clone(),
            ..ShellSettings::default()
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            verify_tls: self.verify_tls,
            reject_http_errors: self.reject_http_errors,
            ..HttpSettings::default()
        }
    }
}
