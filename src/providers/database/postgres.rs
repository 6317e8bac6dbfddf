use crate::config::Config;
use crate::error::Result;
use crate::exec::{ExecOptions, ExecResult, Executor, StdinSource};
use crate::providers::database::{
    BackupStore, expect_success, require_dump_file, run_tool, write_dump,
};
use crate::providers::traits::{DatabaseProvider, SizeReport, TableSize, format_bytes};
use crate::providers::BackupEntry;
use crate::ui;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TABLE_SIZES_SQL: &str = "SELECT relname, pg_total_relation_size(c.oid) \
     FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
     WHERE n.nspname = 'public' AND c.relkind = 'r' \
     ORDER BY pg_total_relation_size(c.oid) DESC";

#[derive(Debug)]
pub struct PostgresProvider {
    executor: Arc<dyn Executor>,
    service: Option<String>,
    database: String,
    user: String,
    password_env: Option<String>,
    store: BackupStore,
}

impl PostgresProvider {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            service: config.database.service.clone(),
            database: config.database.name.clone(),
            user: config.database.user.clone(),
            password_env: config.database.password_env.clone(),
            store: BackupStore::new(config),
            executor,
        }
    }

    fn options(&self) -> ExecOptions {
        let mut opts = ExecOptions::default();
        if let Some(var) = &self.password_env
            && let Ok(password) = std::env::var(var)
        {
            opts = opts.with_env("PGPASSWORD", &password);
        }
        opts
    }

    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        run_tool(&self.executor, self.service.as_deref(), command, args, opts)
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<String>> {
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "-d".to_string(),
            self.database.clone(),
            "-tA".to_string(),
            "-c".to_string(),
            sql.to_string(),
        ];
        let result = expect_success(self.run("psql", &args, &self.options())?, "psql")?;
        Ok(result
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl DatabaseProvider for PostgresProvider {
    fn driver(&self) -> &'static str {
        "postgres"
    }

    fn connect(&self) -> Result<ExecResult> {
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "-d".to_string(),
            self.database.clone(),
        ];
        let opts = ExecOptions {
            interactive: true,
            ..self.options()
        };
        self.run("psql", &args, &opts)
    }

    fn query(&self, sql: &str) -> Result<ExecResult> {
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "-d".to_string(),
            self.database.clone(),
            "-v".to_string(),
            "ON_ERROR_STOP=1".to_string(),
            "-c".to_string(),
            sql.to_string(),
        ];
        self.run("psql", &args, &self.options())
    }

    fn backup(&self, dest: Option<&Path>) -> Result<PathBuf> {
        let path = self.store.backup_path(&self.database, dest)?;
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "--clean".to_string(),
            "--if-exists".to_string(),
            self.database.clone(),
        ];
        let result = self.run("pg_dump", &args, &self.options())?;
        write_dump(&path, &result, "pg_dump")?;
        Ok(path)
    }

    fn restore(&self, source: &Path) -> Result<()> {
        require_dump_file(source)?;
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "-d".to_string(),
            self.database.clone(),
            "-v".to_string(),
            "ON_ERROR_STOP=1".to_string(),
        ];
        let opts = self
            .options()
            .with_stdin(StdinSource::File(source.to_path_buf()));
        expect_success(self.run("psql", &args, &opts)?, "psql")?;
        Ok(())
    }

    fn snapshot(&self, name: Option<&str>) -> Result<PathBuf> {
        let path = self.store.snapshot_path(name)?;
        let args = vec![
            "-U".to_string(),
            self.user.clone(),
            "--clean".to_string(),
            "--if-exists".to_string(),
            self.database.clone(),
        ];
        let result = self.run("pg_dump", &args, &self.options())?;
        write_dump(&path, &result, "pg_dump")?;
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
            .query_rows("SELECT pg_database_size(current_database())")?
            .first()
            .and_then(|row| row.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let tables = self
            .query_rows(TABLE_SIZES_SQL)?
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
            .collect();

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
