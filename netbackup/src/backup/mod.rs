//! Device backup orchestration.
//!
//! Records are classified against the [`DeviceCatalog`], credentials are
//! resolved from the [`SecretStore`](crate::secrets::SecretStore), and each
//! device is handed to the shell or HTTP [`ChannelAdapter`]. The
//! [`Orchestrator`] persists what comes back and builds a [`RunReport`].

pub mod adapter;
pub mod catalog;
pub mod credentials;
pub mod orchestrator;
pub mod registry;
pub mod report;

pub use adapter::{
    ChannelAdapter, Fetched, HttpAdapter, HttpGetter, HttpResponse, HttpSettings, ReqwestGetter,
    ShellAdapter, ShellExecutor, ShellRequest, ShellSettings, SshExecutor,
};
pub use catalog::{ChannelGroup, DeviceCatalog, DeviceKind, HttpKind, ShellKind};
pub use credentials::{Credential, CredentialResolver};
pub use orchestrator::{Orchestrator, RunSettings};
pub use registry::{
    Classification, ClassifiedDevice, DeviceRecord, DeviceRegistry, ValidationPolicy,
};
pub use report::{BackupOutcome, DeviceStatus, RunReport};
