//! Channel adapters: one "fetch configuration" capability per channel group.
//!
//! Adapters never return a batch-level error. Every failure is a
//! [`FetchError`] the orchestrator turns into a `NOT_OK` outcome.

mod http;
mod shell;

pub use http::{HttpAdapter, HttpGetter, HttpResponse, HttpSettings, ReqwestGetter};
pub use shell::{ShellAdapter, ShellExecutor, ShellRequest, ShellSettings, SshExecutor, device_header};

use super::catalog::DeviceKind;
use super::credentials::Credential;
use super::registry::ClassifiedDevice;
use crate::error::{CredentialError, FetchError};

/// What a successful fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// Configuration text, ready to be written as-is.
    Config(String),
    /// The device answered but returned nothing.
    Empty,
}

impl Fetched {
    /// `Empty` for blank text.
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Self::Empty
        } else {
            Self::Config(text)
        }
    }
}

/// The closed set of adapters.
pub enum ChannelAdapter {
    Shell(ShellAdapter),
    Http(HttpAdapter),
}

impl ChannelAdapter {
    /// Fetch a device's configuration.
    ///
    /// The device kind selects the recipe; an adapter handed a device or
    /// credential of the other group fails with a credential error.
    pub async fn fetch(
        &self,
        device: &ClassifiedDevice,
        credential: &Credential,
    ) -> Result<Fetched, FetchError> {
        match (self, &device.kind, credential) {
            (Self::Shell(adapter), DeviceKind::Shell(kind), Credential::Login { username, password }) => {
                adapter.fetch(&device.record, kind, username, password).await
            }
            (Self::Http(adapter), DeviceKind::Http(kind), Credential::Token(token)) => {
                adapter.fetch(&device.record, kind, token).await
            }
            _ => Err(CredentialError::UnknownReference {
                reference: device.record.credential_ref.clone(),
            }
            .into()),
        }
    }
}
