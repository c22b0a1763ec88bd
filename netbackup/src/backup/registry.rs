//! Record validation and classification.

use std::collections::HashSet;
use std::sync::Arc;

use log::{error, warn};

use super::catalog::{ChannelGroup, DeviceCatalog, DeviceKind};
use crate::error::ValidationError;

/// One inventory row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Unique within a run; used as the backup file stem.
    pub name: String,
    pub host: String,
    pub device_kind: String,
    pub credential_ref: String,
}

impl DeviceRecord {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        device_kind: impl Into<String>,
        credential_ref: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            device_kind: device_kind.into(),
            credential_ref: credential_ref.into(),
        }
    }
}

/// A record that passed validation, with its catalog recipe attached.
#[derive(Debug, Clone)]
pub struct ClassifiedDevice {
    /// Position in the input, used to restore input order.
    pub index: usize,
    pub record: DeviceRecord,
    pub kind: DeviceKind,
}

impl ClassifiedDevice {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn group(&self) -> ChannelGroup {
        self.kind.group()
    }
}

/// What to do with a record that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Stop at the first invalid record.
    #[default]
    FailFast,
    /// Log it, list it in the report, carry on.
    SkipInvalid,
}

/// Result of classifying a whole batch.
#[derive(Debug, Default)]
pub struct Classification {
    /// Valid records, in input order, up to the first invalid one under
    /// fail-fast.
    pub devices: Vec<ClassifiedDevice>,
    /// Records skipped under [`ValidationPolicy::SkipInvalid`].
    pub skipped: Vec<ValidationError>,
    /// The record that stopped the batch under [`ValidationPolicy::FailFast`].
    pub aborted: Option<ValidationError>,
}

/// Validates records against the catalog and tracks names already used.
pub struct DeviceRegistry {
    catalog: Arc<DeviceCatalog>,
    seen: HashSet<String>,
    next_index: usize,
}

impl DeviceRegistry {
    pub fn new(catalog: Arc<DeviceCatalog>) -> Self {
        Self {
            catalog,
            seen: HashSet::new(),
            next_index: 0,
        }
    }

    /// Validate one record and attach its recipe.
    ///
    /// Every call consumes an input position, valid or not.
    pub fn classify(&mut self, record: DeviceRecord) -> Result<ClassifiedDevice, ValidationError> {
        let index = self.next_index;
        self.next_index += 1;

        if !is_valid_name(&record.name) {
            return Err(ValidationError::InvalidName {
                device: record.name,
            });
        }

        let kind = self.catalog.lookup(&record.device_kind).ok_or_else(|| {
            ValidationError::UnknownKind {
                device: record.name.clone(),
                kind: record.device_kind.clone(),
            }
        })?;

        if record.host.trim().is_empty() {
            return Err(ValidationError::MissingHost {
                device: record.name,
            });
        }

        if !self.seen.insert(record.name.clone()) {
            return Err(ValidationError::DuplicateName {
                device: record.name,
            });
        }

        Ok(ClassifiedDevice {
            index,
            record,
            kind,
        })
    }

    /// Classify records in order under `policy`.
    pub fn classify_all(
        &mut self,
        records: impl IntoIterator<Item = DeviceRecord>,
        policy: ValidationPolicy,
    ) -> Classification {
        let mut classification = Classification::default();

        for record in records {
            match self.classify(record) {
                Ok(device) => classification.devices.push(device),
                Err(e) => match policy {
                    ValidationPolicy::FailFast => {
                        error!("{e}; stopping at this record");
                        classification.aborted = Some(e);
                        break;
                    }
                    ValidationPolicy::SkipInvalid => {
                        warn!("{e}; skipping");
                        classification.skipped.push(e);
                    }
                },
            }
        }

        classification
    }
}

/// A name must be usable as a file stem inside the backup directory.
fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
