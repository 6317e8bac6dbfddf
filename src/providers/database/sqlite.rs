use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, ExecResult, Executor, StdinSource};
use crate::providers::database::{
    BackupStore, expect_success, require_dump_file, run_tool, write_dump,
};
use crate::providers::traits::{DatabaseProvider, SizeReport, TableSize, format_bytes};
use crate::providers::BackupEntry;
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// SQLite driver. The database file path is interpreted inside the
/// execution context (container, local tree, or remote host), so even the
/// file-backed driver goes through the executor.
#[derive(Debug)]
pub struct SqliteProvider {
    executor: Arc<dyn Executor>,
    service: Option<String>,
    /// Path of the database file within the execution context.
    file: String,
    database: String,
    store: BackupStore,
}

impl SqliteProvider {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Result<Self> {
        let file = config
            .database
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .ok_or_else(|| {
                StackctlError::ConfigError(
                    "sqlite driver requires database { file \"...\" }".to_string(),
                )
            })?;

        let database = if config.database.name.is_empty() {
            Path::new(&file)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sqlite".to_string())
        } else {
            config.database.name.clone()
        };

        Ok(Self {
            service: config.database.service.clone(),
            file,
            database,
            store: BackupStore::new(config),
            executor,
        })
    }

    fn run(&self, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        run_tool(&self.executor, self.service.as_deref(), "sqlite3", args, opts)
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<String>> {
        let args = vec![self.file.clone(), sql.to_string()];
        let result = expect_success(self.run(&args, &ExecOptions::default())?, "sqlite3")?;
        Ok(result
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl DatabaseProvider for SqliteProvider {
    fn driver(&self) -> &'static str {
        "sqlite"
    }

    fn connect(&self) -> Result<ExecResult> {
        self.run(&[self.file.clone()], &ExecOptions::interactive())
    }

    fn query(&self, sql: &str) -> Result<ExecResult> {
        self.run(
            &[self.file.clone(), sql.to_string()],
            &ExecOptions::default(),
        )
    }

    fn backup(&self, dest: Option<&Path>) -> Result<PathBuf> {
        let path = self.store.backup_path(&self.database, dest)?;
        let result = self.run(
            &[self.file.clone(), ".dump".to_string()],
            &ExecOptions::default(),
        )?;
        write_dump(&path, &result, "sqlite3")?;
        Ok(path)
    }

    fn restore(&self, source: &Path) -> Result<()> {
        require_dump_file(source)?;
        let opts = ExecOptions::default().with_stdin(StdinSource::File(source.to_path_buf()));
        expect_success(self.run(&[self.file.clone()], &opts)?, "sqlite3")?;
        Ok(())
    }

    fn snapshot(&self, name: Option<&str>) -> Result<PathBuf> {
        let path = self.store.snapshot_path(name)?;
        let result = self.run(
            &[self.file.clone(), ".dump".to_string()],
            &ExecOptions::default(),
        )?;
        write_dump(&path, &result, "sqlite3")?;
        Ok(path)
    }

    fn rollback(&self) -> Result<PathBuf> {
        let snapshot = self.store.latest_snapshot()?;
        ui::verbose(&format!("rolling back from {}", snapshot.file_name()));
        self.restore(&snapshot.path)?;
        Ok(snapshot.path)
    }

    fn size(&self) -> Result<SizeReport> {
        let total = self
            .query_rows(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
            )?
            .first()
            .and_then(|row| row.trim().parse::<u64>().ok())
            .unwrap_or(0);

        // dbstat needs a compile-time option; fall back to bare names.
        let tables = match self.query_rows(
            "SELECT name, SUM(pgsize) FROM dbstat GROUP BY name ORDER BY SUM(pgsize) DESC",
        ) {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    let (name, bytes) = row.split_once('|')?;
                    let size_bytes = bytes.trim().parse::<u64>().ok()?;
                    Some(TableSize {
                        name: name.trim().to_string(),
                        size_bytes,
                        formatted: format_bytes(size_bytes),
                    })
                })
                .collect(),
            Err(_) => self
                .query_rows("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?
                .iter()
                .map(|name| TableSize {
                    name: name.trim().to_string(),
                    size_bytes: 0,
                    formatted: "-".to_string(),
                })
                .collect(),
        };

        Ok(SizeReport {
            database: self.database.clone(),
            size_bytes: total,
            formatted: format_bytes(total),
            tables,
        })
    }

    fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.store.list_backups()
    }

    fn list_snapshots(&self) -> Result<Vec<BackupEntry>> {
        self.store.list_snapshots()
    }
}
