use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, ExecResult, Executor, StdinSource};
use crate::providers::traits::{
    ObjectInfo, StorageProvider, UsageReport, format_bytes,
};
use std::path::Path;
use std::sync::Arc;

/// S3-compatible bucket driver speaking the `mc` client.
#[derive(Debug)]
pub struct BucketStorageProvider {
    executor: Arc<dyn Executor>,
    alias: String,
    bucket: String,
}

impl BucketStorageProvider {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Result<Self> {
        if config.storage.bucket.is_empty() {
            return Err(StackctlError::ConfigError(
                "bucket driver requires storage { bucket \"...\" }".to_string(),
            ));
        }
        Ok(Self {
            alias: config.storage.alias.clone(),
            bucket: config.storage.bucket.clone(),
            executor,
        })
    }

    fn target(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/{}", self.alias, self.bucket)
        } else {
            format!("{}/{}/{}", self.alias, self.bucket, path)
        }
    }

    fn mc(&self, args: Vec<String>, opts: &ExecOptions) -> Result<ExecResult> {
        self.executor.run("mc", &args, opts)
    }

    fn mc_checked(&self, args: Vec<String>) -> Result<ExecResult> {
        let result = self.mc(args, &ExecOptions::default())?;
        if result.success() {
            Ok(result)
        } else {
            Err(StackctlError::SystemCommandFailed {
                command: "mc".to_string(),
                reason: result.stderr.trim().to_string(),
            })
        }
    }
}

impl StorageProvider for BucketStorageProvider {
    fn driver(&self) -> &'static str {
        "bucket"
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let result = self.mc_checked(vec![
            "ls".to_string(),
            "--json".to_string(),
            self.target(prefix.unwrap_or("")),
        ])?;

        // One JSON object per line; tolerate interleaved noise.
        Ok(result
            .stdout
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|value| {
                value
                    .get("key")
                    .and_then(|k| k.as_str())
                    .map(str::to_string)
            })
            .collect())
    }

    fn upload(&self, local: &Path, dest: &str) -> Result<()> {
        if !local.is_file() {
            return Err(StackctlError::ResourceMissing(format!(
                "Local file not found: {}",
                local.display()
            )));
        }
        self.mc_checked(vec![
            "cp".to_string(),
            local.display().to_string(),
            self.target(dest),
        ])?;
        Ok(())
    }

    fn download(&self, src: &str, local: &Path) -> Result<()> {
        self.mc_checked(vec![
            "cp".to_string(),
            self.target(src),
            local.display().to_string(),
        ])?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.mc_checked(vec![
            "rm".to_string(),
            "--recursive".to_string(),
            "--force".to_string(),
            self.target(path),
        ])?;
        Ok(())
    }

    fn copy(&self, src: &str, dest: &str) -> Result<()> {
        self.mc_checked(vec![
            "cp".to_string(),
            self.target(src),
            self.target(dest),
        ])?;
        Ok(())
    }

    fn rename(&self, src: &str, dest: &str) -> Result<()> {
        self.mc_checked(vec![
            "mv".to_string(),
            self.target(src),
            self.target(dest),
        ])?;
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let result = self.mc(
            vec!["stat".to_string(), self.target(path)],
            &ExecOptions::default(),
        )?;
        Ok(result.success())
    }

    fn stat(&self, path: &str) -> Result<ObjectInfo> {
        let result = self.mc(
            vec![
                "stat".to_string(),
                "--json".to_string(),
                self.target(path),
            ],
            &ExecOptions::default(),
        )?;
        if !result.success() {
            return Err(StackctlError::ResourceMissing(format!(
                "No such object: {}",
                path
            )));
        }

        let value: serde_json::Value = serde_json::from_str(result.trimmed_stdout())?;
        Ok(ObjectInfo {
            path: self.target(path),
            kind: value
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("object")
                .to_string(),
            size_bytes: value.get("size").and_then(|v| v.as_u64()).unwrap_or(0),
            modified: value
                .get("lastModified")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        // Object stores have no directories; drop a zero-byte marker.
        let opts = ExecOptions::default().with_stdin(StdinSource::Bytes(Vec::new()));
        let result = self.mc(
            vec![
                "pipe".to_string(),
                format!("{}/.keep", self.target(path)),
            ],
            &opts,
        )?;
        if result.success() {
            Ok(())
        } else {
            Err(StackctlError::SystemCommandFailed {
                command: "mc".to_string(),
                reason: result.stderr.trim().to_string(),
            })
        }
    }

    fn usage(&self) -> Result<UsageReport> {
        let result = self.mc_checked(vec![
            "du".to_string(),
            "--json".to_string(),
            self.target(""),
        ])?;

        let value: serde_json::Value =
            serde_json::from_str(result.trimmed_stdout()).unwrap_or_default();
        let total_bytes = value.get("size").and_then(|v| v.as_u64()).unwrap_or(0);

        Ok(UsageReport {
            total_bytes,
            formatted: format_bytes(total_bytes),
            objects: value.get("objects").and_then(|v| v.as_u64()),
        })
    }
}
