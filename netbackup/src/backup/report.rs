//! Per-device outcomes and the run report.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Whether a device's configuration was backed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Ok,
    NotOk,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotOk => "NOT_OK",
        }
    }

    /// Label used in the `status` pairs handed to report templates.
    pub fn report_label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotOk => "NOT OK",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Result of one device attempt. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    pub device_name: String,
    pub status: DeviceStatus,
    /// Fetched text, only when `OK`.
    #[serde(skip)]
    pub raw_output: Option<String>,
    /// Failure description, only when `NOT_OK`.
    pub error: Option<String>,
    /// File written, `None` when nothing was written or the write failed.
    pub saved_to: Option<PathBuf>,
}

impl BackupOutcome {
    pub fn ok(device_name: impl Into<String>, raw_output: String, saved_to: Option<PathBuf>) -> Self {
        Self {
            device_name: device_name.into(),
            status: DeviceStatus::Ok,
            raw_output: Some(raw_output),
            error: None,
            saved_to,
        }
    }

    pub fn not_ok(device_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            status: DeviceStatus::NotOk,
            raw_output: None,
            error: Some(error.into()),
            saved_to: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DeviceStatus::Ok
    }
}

/// Everything the renderer and mailer need about a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub org: String,
    /// `YYYYMMDD`.
    pub date: String,
    /// In input order.
    pub outcomes: Vec<BackupOutcome>,
    /// Why the batch stopped early, if it did.
    pub aborted: Option<String>,
    /// Invalid records skipped under the skip policy.
    pub skipped: Vec<String>,
    /// Valid records never dispatched because the run was stopped.
    pub undispatched: Vec<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunReport {
    /// Combine run metadata with the ordered outcomes.
    pub fn aggregate(
        org: impl Into<String>,
        date: impl Into<String>,
        outcomes: Vec<BackupOutcome>,
    ) -> Self {
        Self {
            org: org.into(),
            date: date.into(),
            outcomes,
            aborted: None,
            skipped: vec![],
            undispatched: vec![],
            elapsed: Duration::ZERO,
        }
    }

    /// `(name, label)` pairs in input order.
    pub fn status_pairs(&self) -> Vec<(String, String)> {
        self.outcomes
            .iter()
            .map(|o| (o.device_name.clone(), o.status.report_label().to_string()))
            .collect()
    }

    pub fn ok_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.ok_count()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}
