//! Error types for netbackup.
//!
//! The SSH stack (transport, channel, driver, platform) has its own layered
//! errors. The backup core adds device-scoped [`FetchError`]s, which are
//! always recovered into a `NOT_OK` outcome, and batch-scoped errors that
//! stop the run before or after the device loop.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netbackup operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Device catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Inventory file errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Secrets file errors
    #[error("Secrets error: {0}")]
    Secrets(#[from] SecretsError),

    /// Backup output errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Report rendering errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Report mailing errors
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key does not match the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Output never went quiet within the read budget
    #[error("Output still arriving after {0:?}")]
    DrainTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Command output matched one of the platform's failure strings
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Platform name not known to the registry
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Invalid prompt regex
    #[error("Invalid prompt pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A record that cannot be classified or used as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Device kind is empty or not present in the catalog
    #[error("device '{device}': unknown device_kind '{kind}'")]
    UnknownKind { device: String, kind: String },

    /// Name is empty or cannot be used as a file name
    #[error("device '{device}': invalid name")]
    InvalidName { device: String },

    /// Name already used by an earlier record in the batch
    #[error("device '{device}': duplicate name")]
    DuplicateName { device: String },

    /// Host is empty
    #[error("device '{device}': missing host")]
    MissingHost { device: String },
}

impl ValidationError {
    /// The offending record's name.
    pub fn device(&self) -> &str {
        match self {
            Self::UnknownKind { device, .. }
            | Self::InvalidName { device }
            | Self::DuplicateName { device }
            | Self::MissingHost { device } => device,
        }
    }
}

/// Credential resolution failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Shell credential reference is not a known login set
    #[error("unknown credential reference '{reference}'")]
    UnknownReference { reference: String },

    /// Secret entry named by the reference is absent
    #[error("no secret named '{key}'")]
    MissingSecret { key: String },
}

/// Device-scoped errors raised while fetching a configuration.
///
/// These never abort a batch; the orchestrator turns each into a `NOT_OK`
/// outcome.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Credentials could not be resolved
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Login rejected by the device
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Device unreachable or session dropped
    #[error("connection failed: {0}")]
    Connection(String),

    /// Shell session misbehaved (prompt not found, command rejected, ...)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// HTTP request failed below the HTTP layer (DNS, refused, TLS)
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP response with a non-success status, when such responses are rejected
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    /// Device exceeded its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Run was cancelled while the device was in flight
    #[error("cancelled")]
    Cancelled,
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::Transport(TransportError::AuthenticationFailed { user }) => {
                FetchError::Authentication(format!("rejected login for user '{user}'"))
            }
            Error::Transport(TransportError::Timeout(after)) => FetchError::Timeout(after),
            Error::Transport(e) => FetchError::Connection(e.to_string()),
            Error::Channel(ChannelError::Closed) => {
                FetchError::Connection("channel closed".to_string())
            }
            Error::Driver(DriverError::PrivilegeAcquisitionFailed { target }) => {
                FetchError::Authentication(format!("could not enter privilege level '{target}'"))
            }
            other => FetchError::Protocol(other.to_string()),
        }
    }
}

/// Device catalog construction errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The same kind is listed in both channel groups
    #[error("device kind '{kind}' is listed as both shell and http")]
    AmbiguousKind { kind: String },

    /// A shell kind references a platform that does not exist
    #[error("device kind '{kind}' uses unknown platform '{platform}'")]
    UnknownPlatform { kind: String, platform: String },

    /// Catalog file unreadable
    #[error("failed to read catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Catalog file is not valid YAML for the schema
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Inventory file errors.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Inventory file unreadable
    #[error("failed to read inventory {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Row with the wrong number of fields
    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    /// Header row missing
    #[error("inventory is empty")]
    Empty,
}

/// Secrets file errors.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Env file missing or malformed
    #[error("failed to load secrets from {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// Required entry absent
    #[error("missing required secret '{key}'")]
    Missing { key: String },

    /// Entry present but unusable
    #[error("secret '{key}' is invalid: {message}")]
    Invalid { key: String, message: String },
}

/// Failure to write a backup file.
#[derive(Error, Debug)]
#[error("failed to write {path:?}: {source}")]
pub struct PersistenceError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Report rendering errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Template file unreadable
    #[error("failed to read template {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Template failed to compile or render
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Report mailing errors.
#[derive(Error, Debug)]
pub enum MailError {
    /// Address or message could not be built
    #[error("invalid message: {0}")]
    Message(String),

    /// SMTP exchange failed
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Result type alias using netbackup's Error.
pub type Result<T> = std::result::Result<T, Error>;
