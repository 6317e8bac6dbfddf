//! Database providers.
//!
//! Each driver issues its domain operations through the executor it was
//! built with. Dumps are captured from the dump tool's stdout and written
//! locally; restores feed a local file to the client's stdin, so no driver
//! ever assumes filesystem access to where the database actually lives.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlProvider;
pub use postgres::PostgresProvider;
pub use sqlite::SqliteProvider;

use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, ExecResult, Executor};
use crate::providers::traits::BackupEntry;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Backup and snapshot files for one database, under the configured
/// backup directory (snapshots in a `snapshots/` subdirectory).
#[derive(Debug)]
pub(crate) struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.resolve(&config.database.backup_dir),
        }
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.dir.join("snapshots")
    }

    /// Path for a new backup file, creating the directory if absent.
    pub fn backup_path(&self, database: &str, dest: Option<&Path>) -> Result<PathBuf> {
        if let Some(dest) = dest {
            if let Some(parent) = dest.parent()
                && !parent.as_os_str().is_empty()
            {
                ensure_dir(parent)?;
            }
            return Ok(dest.to_path_buf());
        }
        ensure_dir(&self.dir)?;
        Ok(self
            .dir
            .join(format!("backup-{}-{}.sql", database, timestamp())))
    }

    /// Path for a new snapshot file, creating the directory if absent.
    pub fn snapshot_path(&self, name: Option<&str>) -> Result<PathBuf> {
        let dir = self.snapshots_dir();
        ensure_dir(&dir)?;
        let stem = match name {
            Some(name) => name.to_string(),
            None => timestamp(),
        };
        Ok(dir.join(format!("snapshot-{}.sql", stem)))
    }

    /// Backups, newest first by modification time.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        list_by_mtime(&self.dir)
    }

    /// Snapshots, newest first by modification time.
    pub fn list_snapshots(&self) -> Result<Vec<BackupEntry>> {
        list_by_mtime(&self.snapshots_dir())
    }

    /// The snapshot with the latest modification time, regardless of name.
    pub fn latest_snapshot(&self) -> Result<BackupEntry> {
        self.list_snapshots()?
            .into_iter()
            .next()
            .ok_or_else(|| StackctlError::ResourceMissing("No snapshots available".to_string()))
    }
}

/// Files in a directory sorted by modification time, newest first.
/// A missing directory is an empty listing, not an error.
fn list_by_mtime(dir: &Path) -> Result<Vec<BackupEntry>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| StackctlError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(StackctlError::StdIoError)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let meta = entry.metadata().map_err(StackctlError::StdIoError)?;
        entries.push(BackupEntry {
            path,
            size: meta.len(),
            modified: meta.modified().unwrap_or(std::time::UNIX_EPOCH),
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(entries)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| StackctlError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })
}

pub(crate) fn timestamp() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Write a captured dump to disk, or fail with the tool's stderr.
pub(crate) fn write_dump(path: &Path, result: &ExecResult, tool: &str) -> Result<()> {
    if !result.success() {
        return Err(StackctlError::SystemCommandFailed {
            command: tool.to_string(),
            reason: first_error_line(result),
        });
    }
    std::fs::write(path, &result.stdout).map_err(|e| StackctlError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Turn a failed client call into an error with its stderr attached.
pub(crate) fn expect_success(result: ExecResult, tool: &str) -> Result<ExecResult> {
    if result.success() {
        Ok(result)
    } else {
        Err(StackctlError::SystemCommandFailed {
            command: tool.to_string(),
            reason: first_error_line(&result),
        })
    }
}

fn first_error_line(result: &ExecResult) -> String {
    result
        .stderr
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("exited with a non-zero status")
        .to_string()
}

/// Run a database tool in the configured service, or directly through the
/// executor when no service is set.
pub(crate) fn run_tool(
    executor: &Arc<dyn Executor>,
    service: Option<&str>,
    command: &str,
    args: &[String],
    opts: &ExecOptions,
) -> Result<ExecResult> {
    match service {
        Some(service) => executor.run_in_service(service, command, args, opts),
        None => executor.run(command, args, opts),
    }
}

/// Require a local dump file to exist before feeding it to a restore.
pub(crate) fn require_dump_file(source: &Path) -> Result<()> {
    if source.is_file() {
        Ok(())
    } else {
        Err(StackctlError::ResourceMissing(format!(
            "Backup file not found: {}",
            source.display()
        )))
    }
}
