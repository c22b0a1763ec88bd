//! # netbackup
//!
//! Configuration backups for multi-vendor network devices.
//!
//! Devices are listed in a `;`-delimited inventory. Each one is backed up
//! either over an interactive SSH shell (MikroTik RouterOS, Ubiquiti
//! EdgeSwitch, Cisco Small Business) or through an HTTP API (FortiGate).
//! Every device ends up `OK` or `NOT_OK` in a run report; one device failing
//! never stops the others.
//!
//! ## Layers
//!
//! - [`transport`], [`channel`], [`platform`], [`driver`]: async SSH CLI
//!   scraping with prompt detection, privilege levels and two ways of
//!   reading command output.
//! - [`backup`]: catalog, classification, credentials, channel adapters
//!   and the orchestrator.
//! - [`inventory`], [`secrets`], [`storage`], [`render`], [`mail`],
//!   [`cli`], [`logging`]: the run's inputs and outputs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netbackup::backup::{
//!     CredentialResolver, DeviceCatalog, DeviceRecord, HttpAdapter, HttpSettings, Orchestrator,
//!     ReqwestGetter, RunSettings, ShellAdapter, SshExecutor,
//! };
//! use netbackup::platform::PlatformRegistry;
//! use netbackup::secrets::SecretStore;
//! use netbackup::storage::BackupStore;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netbackup::Error> {
//!     let secrets = Arc::new(SecretStore::load("netbackup.env".as_ref())?);
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(DeviceCatalog::builtin()),
//!         CredentialResolver::new(secrets, false),
//!         ShellAdapter::new(
//!             Arc::new(SshExecutor::default()),
//!             Arc::new(PlatformRegistry::with_builtins()),
//!         ),
//!         HttpAdapter::new(Arc::new(ReqwestGetter::new(&HttpSettings::default())?), false),
//!         BackupStore::today("/srv/backups"),
//!         RunSettings::default(),
//!     );
//!
//!     let records = vec![DeviceRecord::new("sw1", "10.0.0.1", "mikrotik_routeros", "MAIN_USER")];
//!     let report = orchestrator.run("Example", records, CancellationToken::new()).await;
//!     println!("{} OK, {} NOT_OK", report.ok_count(), report.failed_count());
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod channel;
pub mod cli;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod mail;
pub mod platform;
pub mod render;
pub mod secrets;
pub mod storage;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Driver, DriverBuilder, GenericDriver, ReadStrategy, Response};
pub use error::{Error, Result};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use transport::{AuthMethod, SshConfig};
