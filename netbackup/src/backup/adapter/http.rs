//! HTTP API adapter.

use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use secrecy::{ExposeSecret, SecretString};

use super::Fetched;
use crate::backup::catalog::HttpKind;
use crate::backup::registry::DeviceRecord;
use crate::error::FetchError;

/// HTTP client settings. Both trust decisions are explicit configuration.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Validate server certificates. Off by default: firewall management
    /// interfaces ship self-signed certificates.
    pub verify_tls: bool,
    /// Treat non-success statuses as failures instead of backing up the body.
    pub reject_http_errors: bool,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            verify_tls: false,
            reject_http_errors: false,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Status and body of a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issue a GET against a URL and return the body as text.
#[async_trait]
pub trait HttpGetter: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// [`HttpGetter`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestGetter {
    client: reqwest::Client,
}

impl ReqwestGetter {
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpGetter for ReqwestGetter {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(describe(e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(describe(e)))?;

        Ok(HttpResponse { status, body })
    }
}

/// Error text with its cause chain, without the URL (it carries the token).
fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Request URL with `***` in place of the token, for logging.
///
/// Built from the parts rather than cut out of the full URL: a token may
/// itself contain `=` or `&`.
fn log_url(kind: &HttpKind, host: &str) -> String {
    format!("{}://{}{}***", kind.scheme, host, kind.path)
}

/// Fetches configurations from device HTTP APIs.
pub struct HttpAdapter {
    getter: Arc<dyn HttpGetter>,
    reject_http_errors: bool,
}

impl HttpAdapter {
    pub fn new(getter: Arc<dyn HttpGetter>, reject_http_errors: bool) -> Self {
        Self {
            getter,
            reject_http_errors,
        }
    }

    pub(crate) async fn fetch(
        &self,
        record: &DeviceRecord,
        kind: &HttpKind,
        token: &SecretString,
    ) -> Result<Fetched, FetchError> {
        let url = format!(
            "{}://{}{}{}",
            kind.scheme,
            record.host,
            kind.path,
            token.expose_secret()
        );
        info!("{}: GET {}", record.name, log_url(kind, &record.host));

        let response = self.getter.get(&url).await?;

        if !response.is_success() {
            warn!(
                "{}: API answered with HTTP status {}",
                record.name, response.status
            );
            if self.reject_http_errors {
                return Err(FetchError::HttpStatus {
                    status: response.status,
                });
            }
        }

        Ok(Fetched::from_text(response.body))
    }
}
