//! Local backend: runs commands directly on the machine.
//!
//! There is no service group locally, so the lifecycle calls are
//! documented no-ops and service keys are opaque labels kept only for
//! diagnostics.

use crate::config::{Config, ExecutorConfig};
use crate::error::{Result, StackctlError};
use crate::exec::process;
use crate::exec::{ExecOptions, ExecResult, Executor, ExecutorInfo, LogOptions, ServiceStatus};
use crate::ui;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug)]
pub struct LocalExecutor {
    shell: String,
    working_dir: PathBuf,
}

impl LocalExecutor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let ExecutorConfig::Local { shell, working_dir } = &config.executor else {
            return Err(StackctlError::ConfigError(
                "executor mode is not local".to_string(),
            ));
        };

        let working_dir = working_dir
            .as_ref()
            .map(|dir| config.resolve(dir))
            .unwrap_or_else(|| config.root.clone());

        Ok(Self {
            shell: shell.clone(),
            working_dir,
        })
    }

}

impl Executor for LocalExecutor {
    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut cmd = Command::new(command);
        cmd.args(args).current_dir(&self.working_dir);
        for (key, value) in &opts.env {
            cmd.env(key, value);
        }
        if opts.interactive {
            Ok(process::interactive(&mut cmd))
        } else {
            Ok(process::capture(&mut cmd, opts.stdin.as_ref()))
        }
    }

    fn run_in_service(
        &self,
        service: &str,
        command: &str,
        args: &[String],
        opts: &ExecOptions,
    ) -> Result<ExecResult> {
        // The label has no local meaning; keep it visible for debugging.
        ui::verbose(&format!("running '{}' locally (service label: {})", command, service));
        self.run(command, args, opts)
    }

    fn start(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        // No service group locally.
        Ok(ExecResult::noop())
    }

    fn stop(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        Ok(ExecResult::noop())
    }

    fn restart(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        Ok(ExecResult::noop())
    }

    fn status(&self, _services: &[String]) -> Result<Vec<ServiceStatus>> {
        Ok(vec![ServiceStatus {
            service: "local".to_string(),
            resolved: None,
            state: "available".to_string(),
            detail: format!("{} in {}", self.shell, self.working_dir.display()),
        }])
    }

    fn logs(&self, _services: &[String], _opts: &LogOptions) -> Result<ExecResult> {
        // Nothing aggregates logs locally.
        Ok(ExecResult::noop())
    }

    fn copy_into(&self, _service: Option<&str>, local: &Path, dest: &str) -> Result<ExecResult> {
        self.run(
            "cp",
            &[local.display().to_string(), dest.to_string()],
            &ExecOptions::default(),
        )
    }

    fn copy_out(&self, _service: Option<&str>, src: &str, local: &Path) -> Result<ExecResult> {
        self.run(
            "cp",
            &[src.to_string(), local.display().to_string()],
            &ExecOptions::default(),
        )
    }

    fn is_available(&self) -> bool {
        true
    }

    fn resolve_service(&self, key: &str) -> Option<String> {
        // Passthrough label, only used for diagnostics.
        Some(key.to_string())
    }

    fn info(&self) -> ExecutorInfo {
        ExecutorInfo {
            backend: "local",
            target: self.working_dir.display().to_string(),
            details: vec![("shell".to_string(), self.shell.clone())],
        }
    }
}
