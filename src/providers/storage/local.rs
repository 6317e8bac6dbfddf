use crate::config::Config;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, ExecResult, Executor};
use crate::providers::traits::{
    ObjectInfo, StorageProvider, UsageReport, format_bytes,
};
use std::path::Path;
use std::sync::Arc;

pub struct LocalStorageProvider {
    executor: Arc<dyn Executor>,
    /// Service key when the tree lives inside a container.
    service: Option<String>,
    root: String,
}

impl LocalStorageProvider {
    pub fn new(config: &Config, executor: Arc<dyn Executor>) -> Self {
        Self {
            service: config.storage.service.clone(),
            root: config.storage.root.trim_end_matches('/').to_string(),
            executor,
        }
    }

    fn full(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            self.root.clone()
        } else {
            format!("{}/{}", self.root, path)
        }
    }

    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        match &self.service {
            Some(service) => self
                .executor
                .run_in_service(service, command, args, opts),
            None => self.executor.run(command, args, opts),
        }
    }

    fn run_checked(&self, command: &str, args: &[String]) -> Result<ExecResult> {
        let result = self.run(command, args, &ExecOptions::default())?;
        if result.success() {
            Ok(result)
        } else {
            Err(StackctlError::SystemCommandFailed {
                command: command.to_string(),
                reason: result.stderr.trim().to_string(),
            })
        }
    }
}

impl StorageProvider for LocalStorageProvider {
    fn driver(&self) -> &'static str {
        "local"
    }

    fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let target = self.full(prefix.unwrap_or(""));
        let result = self.run("ls", &["-1A".to_string(), target], &ExecOptions::default())?;
        if !result.success() {
            // An empty or missing tree is an empty listing.
            return Ok(Vec::new());
        }
        Ok(result
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    fn upload(&self, local: &Path, dest: &str) -> Result<()> {
        if !local.is_file() {
            return Err(StackctlError::ResourceMissing(format!(
                "Local file not found: {}",
                local.display()
            )));
        }
        let result = self
            .executor
            .copy_into(self.service.as_deref(), local, &self.full(dest))?;
        if result.success() {
            Ok(())
        } else {
            Err(StackctlError::SystemCommandFailed {
                command: "copy".to_string(),
                reason: result.stderr.trim().to_string(),
            })
        }
    }

    fn download(&self, src: &str, local: &Path) -> Result<()> {
        let result = self
            .executor
            .copy_out(self.service.as_deref(), &self.full(src), local)?;
        if result.success() {
            Ok(())
        } else {
            Err(StackctlError::SystemCommandFailed {
                command: "copy".to_string(),
                reason: result.stderr.trim().to_string(),
            })
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.run_checked("rm", &["-rf".to_string(), self.full(path)])?;
        Ok(())
    }

    fn copy(&self, src: &str, dest: &str) -> Result<()> {
        self.run_checked("cp", &["-r".to_string(), self.full(src), self.full(dest)])?;
        Ok(())
    }

    fn rename(&self, src: &str, dest: &str) -> Result<()> {
        self.run_checked("mv", &[self.full(src), self.full(dest)])?;
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let result = self.run(
            "test",
            &["-e".to_string(), self.full(path)],
            &ExecOptions::default(),
        )?;
        Ok(result.success())
    }

    fn stat(&self, path: &str) -> Result<ObjectInfo> {
        let target = self.full(path);
        let result = self.run(
            "stat",
            &["-c".to_string(), "%F|%s|%y".to_string(), target.clone()],
            &ExecOptions::default(),
        )?;
        if !result.success() {
            return Err(StackctlError::ResourceMissing(format!(
                "No such object: {}",
                path
            )));
        }

        let line = result.trimmed_stdout();
        let mut parts = line.splitn(3, '|');
        let kind = parts.next().unwrap_or("unknown").to_string();
        let size_bytes = parts
            .next()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let modified = parts.next().map(|s| s.trim().to_string());

        Ok(ObjectInfo {
            path: target,
            kind,
            size_bytes,
            modified,
        })
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        self.run_checked("mkdir", &["-p".to_string(), self.full(path)])?;
        Ok(())
    }

    fn usage(&self) -> Result<UsageReport> {
        let result = self.run_checked("du", &["-sb".to_string(), self.root.clone()])?;
        let total_bytes = result
            .trimmed_stdout()
            .split_whitespace()
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(UsageReport {
            total_bytes,
            formatted: format_bytes(total_bytes),
            objects: None,
        })
    }
}
