//! Run log: `<log_dir>/<YYYYMMDD>-backup-log.txt`, appended to.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use env_logger::{Builder, Env, Target};

use crate::storage::date_stamp;

pub fn log_path(log_dir: &Path, date: NaiveDate) -> PathBuf {
    log_dir.join(format!("{}-backup-log.txt", date_stamp(date)))
}

/// Install the global logger writing `<time> - <LEVEL> - <message>` lines.
///
/// The filter defaults to `info` and follows `RUST_LOG` when set.
pub fn init(log_dir: &Path, date: NaiveDate) -> io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_path(log_dir, date);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}
