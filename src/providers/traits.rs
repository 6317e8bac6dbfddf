use crate::error::Result;
use crate::exec::ExecResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Resource kinds a provider can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Database,
    Storage,
    Hosts,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Storage => "storage",
            Self::Hosts => "hosts",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backup or snapshot file on disk.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl BackupEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSize {
    pub name: String,
    pub size_bytes: u64,
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    pub database: String,
    pub size_bytes: u64,
    pub formatted: String,
    pub tables: Vec<TableSize>,
}

/// Database operations.
///
/// Implementations never touch the resource with direct process I/O;
/// everything routes through the executor they were built with, so the
/// same driver works in a container, locally, or over ssh.
pub trait DatabaseProvider: Send + Sync + std::fmt::Debug {
    fn driver(&self) -> &'static str;

    /// Open an interactive client session.
    fn connect(&self) -> Result<ExecResult>;

    /// Run a single statement and capture its output.
    fn query(&self, sql: &str) -> Result<ExecResult>;

    /// Dump the database. Returns the written file's path.
    fn backup(&self, dest: Option<&Path>) -> Result<PathBuf>;

    /// Load a dump file into the database.
    fn restore(&self, source: &Path) -> Result<()>;

    /// Quick timestamp-named backup intended for fast rollback.
    fn snapshot(&self, name: Option<&str>) -> Result<PathBuf>;

    /// Restore the most recent snapshot by modification time.
    fn rollback(&self) -> Result<PathBuf>;

    fn size(&self) -> Result<SizeReport>;

    /// Newest first, by modification time.
    fn list_backups(&self) -> Result<Vec<BackupEntry>>;
    /// Newest first, by modification time.
    fn list_snapshots(&self) -> Result<Vec<BackupEntry>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub path: String,
    pub kind: String,
    pub size_bytes: u64,
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub total_bytes: u64,
    pub formatted: String,
    pub objects: Option<u64>,
}

/// Object storage operations, same executor-delegation discipline.
pub trait StorageProvider: Send + Sync {
    fn driver(&self) -> &'static str;

    fn list(&self, prefix: Option<&str>) -> Result<Vec<String>>;
    fn upload(&self, local: &Path, dest: &str) -> Result<()>;
    fn download(&self, src: &str, local: &Path) -> Result<()>;
    fn delete(&self, path: &str) -> Result<()>;
    fn copy(&self, src: &str, dest: &str) -> Result<()>;
    fn rename(&self, src: &str, dest: &str) -> Result<()>;
    fn exists(&self, path: &str) -> Result<bool>;
    fn stat(&self, path: &str) -> Result<ObjectInfo>;
    fn mkdir(&self, path: &str) -> Result<()>;
    fn usage(&self) -> Result<UsageReport>;
}

/// One hostname/IP pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub hostname: String,
    pub ip: String,
}

/// What happened to one entry during an additive or subtractive call.
///
/// Additive operations are idempotent: an entry that is already present
/// is skipped, a missing entry on removal is reported, neither errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Added,
    Updated,
    Skipped,
    Removed,
    NotFound,
}

impl EntryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Removed => "removed",
            Self::NotFound => "not found",
        }
    }
}

/// Hosts-file operations over the managed entry block.
pub trait HostsProvider: Send + Sync {
    fn driver(&self) -> &'static str;

    fn add_entries(&self, entries: &[HostEntry]) -> Result<Vec<(HostEntry, EntryOutcome)>>;
    fn remove_entries(&self, hostnames: &[String]) -> Result<Vec<(String, EntryOutcome)>>;
    fn check_entries(&self, entries: &[HostEntry]) -> Result<Vec<(HostEntry, bool)>>;
    fn list_entries(&self) -> Result<Vec<HostEntry>>;
}

/// Human-readable byte size, shared by size and usage reports.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
