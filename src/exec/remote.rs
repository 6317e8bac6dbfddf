//! Remote backend: runs commands on a host over ssh, copies files with scp.

use crate::config::{Config, ExecutorConfig};
use crate::error::{Result, StackctlError};
use crate::exec::process;
use crate::exec::{ExecOptions, ExecResult, Executor, ExecutorInfo, LogOptions, ServiceStatus};
use crate::ui;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// A probe taking longer than this counts as unreachable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct RemoteExecutor {
    host: String,
    user: Option<String>,
    port: Option<u16>,
    identity: Option<PathBuf>,
    working_dir: Option<String>,
}

impl RemoteExecutor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let ExecutorConfig::Remote {
            host,
            user,
            port,
            identity,
            working_dir,
        } = &config.executor
        else {
            return Err(StackctlError::ConfigError(
                "executor mode is not remote".to_string(),
            ));
        };

        if host.is_empty() {
            return Err(StackctlError::ConfigError(
                "remote executor requires a host".to_string(),
            ));
        }

        Ok(Self {
            host: host.clone(),
            user: user.clone(),
            port: *port,
            identity: identity.as_ref().map(|p| config.resolve(p)),
            working_dir: working_dir.clone(),
        })
    }

    fn target(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// ssh with connection flags applied. Interactive calls request a
    /// pseudo-terminal; non-interactive calls do not.
    fn ssh(&self, interactive: bool) -> Command {
        let mut cmd = Command::new("ssh");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        if interactive {
            cmd.arg("-t");
        } else {
            cmd.arg("-o").arg("BatchMode=yes");
        }
        cmd.arg(self.target());
        cmd
    }

    fn scp(&self) -> Command {
        let mut cmd = Command::new("scp");
        if let Some(port) = self.port {
            cmd.arg("-P").arg(port.to_string());
        }
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        cmd
    }

    /// Build the remote shell line: cd into the working directory, set
    /// per-call env, then the quoted command.
    fn remote_line(&self, command: &str, args: &[String], opts: &ExecOptions) -> String {
        let mut words: Vec<&str> = vec![command];
        words.extend(args.iter().map(String::as_str));
        let mut line =
            shlex::try_join(words.clone()).unwrap_or_else(|_| words.join(" "));

        for (key, value) in opts.env.iter().rev() {
            let quoted = shlex::try_quote(value)
                .map(|q| q.into_owned())
                .unwrap_or_else(|_| value.clone());
            line = format!("{}={} {}", key, quoted, line);
        }

        match &self.working_dir {
            Some(dir) => format!("cd {} && {}", dir, line),
            None => line,
        }
    }

    /// Resolve a remote path against the configured working directory.
    fn remote_path(&self, path: &str) -> String {
        match &self.working_dir {
            Some(dir) if !path.starts_with('/') => format!("{}/{}", dir, path),
            _ => path.to_string(),
        }
    }
}

impl Executor for RemoteExecutor {
    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut cmd = self.ssh(opts.interactive);
        cmd.arg(self.remote_line(command, args, opts));
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
        // No service group over ssh; the key is a diagnostic label.
        ui::verbose(&format!(
            "running '{}' on {} (service label: {})",
            command,
            self.target(),
            service
        ));
        self.run(command, args, opts)
    }

    fn start(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        // No service group concept on a plain remote host.
        Ok(ExecResult::noop())
    }

    fn stop(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        Ok(ExecResult::noop())
    }

    fn restart(&self, _services: &[String], _opts: &ExecOptions) -> Result<ExecResult> {
        Ok(ExecResult::noop())
    }

    fn status(&self, _services: &[String]) -> Result<Vec<ServiceStatus>> {
        let reachable = self.is_available();
        Ok(vec![ServiceStatus {
            service: "remote".to_string(),
            resolved: Some(self.target()),
            state: if reachable { "reachable" } else { "unreachable" }.to_string(),
            detail: self
                .working_dir
                .clone()
                .unwrap_or_else(|| "~".to_string()),
        }])
    }

    fn logs(&self, _services: &[String], _opts: &LogOptions) -> Result<ExecResult> {
        // Nothing aggregates logs on a plain remote host.
        Ok(ExecResult::noop())
    }

    fn copy_into(&self, _service: Option<&str>, local: &Path, dest: &str) -> Result<ExecResult> {
        let mut cmd = self.scp();
        cmd.arg(local)
            .arg(format!("{}:{}", self.target(), self.remote_path(dest)));
        Ok(process::capture(&mut cmd, None))
    }

    fn copy_out(&self, _service: Option<&str>, src: &str, local: &Path) -> Result<ExecResult> {
        let mut cmd = self.scp();
        cmd.arg(format!("{}:{}", self.target(), self.remote_path(src)))
            .arg(local);
        Ok(process::capture(&mut cmd, None))
    }

    fn is_available(&self) -> bool {
        if which::which("ssh").is_err() {
            return false;
        }
        let mut cmd = Command::new("ssh");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("ConnectTimeout=10")
            .arg(self.target())
            .arg("true");

        match process::capture_with_timeout(&mut cmd, PROBE_TIMEOUT) {
            Some(result) => result.success(),
            None => false,
        }
    }

    fn resolve_service(&self, key: &str) -> Option<String> {
        Some(key.to_string())
    }

    fn info(&self) -> ExecutorInfo {
        let mut details = Vec::new();
        if let Some(port) = self.port {
            details.push(("port".to_string(), port.to_string()));
        }
        if let Some(identity) = &self.identity {
            details.push(("identity".to_string(), identity.display().to_string()));
        }
        if let Some(dir) = &self.working_dir {
            details.push(("working-dir".to_string(), dir.clone()));
        }
        ExecutorInfo {
            backend: "remote",
            target: self.target(),
            details,
        }
    }
}
