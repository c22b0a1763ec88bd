//! Dated backup directory layout: `<root>/<YYYYMMDD>/<name>.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::info;

use crate::error::PersistenceError;

/// Run date as used in directory names and the report.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Writes one file per device under the directory for the run date.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    date: NaiveDate,
}

impl BackupStore {
    pub fn new(root: impl AsRef<Path>, date: NaiveDate) -> Self {
        Self {
            dir: root.as_ref().join(date_stamp(date)),
            date,
        }
    }

    /// Store for today's local date.
    pub fn today(root: impl AsRef<Path>) -> Self {
        Self::new(root, Local::now().date_naive())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Create the day's directory if needed.
    pub fn prepare(&self) -> Result<(), PersistenceError> {
        if self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError {
            path: self.dir.clone(),
            source,
        })?;
        info!("created backup directory {}", self.dir.display());
        Ok(())
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.txt"))
    }

    /// Write (or overwrite) the backup for `name`.
    pub fn save(&self, name: &str, content: &str) -> Result<PathBuf, PersistenceError> {
        self.prepare()?;
        let path = self.path_for(name);
        fs::write(&path, content).map_err(|source| PersistenceError {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_layout() {
        let root = tempfile::tempdir().unwrap();
        let store = BackupStore::new(root.path(), date());

        assert_eq!(date_stamp(date()), "20240307");
        assert_eq!(store.dir(), root.path().join("20240307"));
        assert_eq!(store.path_for("sw1"), root.path().join("20240307").join("sw1.txt"));
    }

    #[test]
    fn test_save_creates_directory_and_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let store = BackupStore::new(root.path(), date());

        let path = store.save("sw1", "first run\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first run\n");

        store.save("sw1", "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_save_failure() {
        let root = tempfile::tempdir().unwrap();
        // A file where the dated directory should go
        fs::write(root.path().join("20240307"), "").unwrap();
        let store = BackupStore::new(root.path(), date());

        let err = store.save("sw1", "config").unwrap_err();
        assert_eq!(err.path, root.path().join("20240307"));
    }
}
