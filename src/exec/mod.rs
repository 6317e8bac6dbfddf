//! Execution backends.
//!
//! An [`Executor`] runs commands somewhere: inside a compose stack, on the
//! local machine, or on a remote host over ssh. Providers and commands are
//! written against the trait, so the same logic works unchanged whichever
//! backend the configuration selects.
//!
//! Error policy: external-tool failure is data, not an error. Every run
//! returns an [`ExecResult`] whose `exit_code` callers inspect; only
//! configuration problems (unmapped service, missing remote host, missing
//! compose file) raise.

pub mod compose;
pub mod local;
mod process;
pub mod remote;

use crate::config::{Config, ExecutorConfig};
use crate::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use compose::ComposeExecutor;
pub use local::LocalExecutor;
pub use remote::RemoteExecutor;

/// Outcome of a single external command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// An immediately-successful result for documented no-op capabilities.
    pub fn noop() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn trimmed_stdout(&self) -> &str {
        self.stdout.trim()
    }
}

/// What to feed the child process on stdin.
#[derive(Debug, Clone)]
pub enum StdinSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// Per-call options for executor operations.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Inherit the terminal (interactive clients, shells). Remote runs
    /// request a pseudo-terminal; captured output is empty.
    pub interactive: bool,
    /// Extra environment for the child process.
    pub env: Vec<(String, String)>,
    pub stdin: Option<StdinSource>,
}

impl ExecOptions {
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_stdin(mut self, stdin: StdinSource) -> Self {
        self.stdin = Some(stdin);
        self
    }
}

/// Options for log streaming.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub follow: bool,
    pub tail: Option<u32>,
}

/// One service's state as reported by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// Service key as configured.
    pub service: String,
    /// Backend-specific identifier, when the key resolves to one.
    pub resolved: Option<String>,
    pub state: String,
    pub detail: String,
}

/// Descriptive record for diagnostics (`stackctl info`).
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorInfo {
    pub backend: &'static str,
    pub target: String,
    pub details: Vec<(String, String)>,
}

/// The backend abstraction: runs commands, addresses named services, and
/// manages the service group where one exists.
///
/// Every variant answers every capability; where a backend has no service
/// group concept the lifecycle calls are documented no-ops.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a raw command in the backend's working context.
    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult>;

    /// Run a command addressed to a named service.
    fn run_in_service(
        &self,
        service: &str,
        command: &str,
        args: &[String],
        opts: &ExecOptions,
    ) -> Result<ExecResult>;

    /// Start the given services (empty slice: all).
    fn start(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult>;
    fn stop(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult>;
    fn restart(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult>;

    fn status(&self, services: &[String]) -> Result<Vec<ServiceStatus>>;
    fn logs(&self, services: &[String], opts: &LogOptions) -> Result<ExecResult>;

    /// Copy a local file into the execution context.
    fn copy_into(&self, service: Option<&str>, local: &Path, dest: &str) -> Result<ExecResult>;
    /// Copy a file out of the execution context to a local path.
    fn copy_out(&self, service: Option<&str>, src: &str, local: &Path) -> Result<ExecResult>;

    /// Lightweight availability probe. Never raises; unreachable or
    /// misconfigured backends answer `false`.
    fn is_available(&self) -> bool;

    /// Resolve a service key to a backend-specific identifier, or `None`
    /// where the backend has no mapping for it.
    fn resolve_service(&self, key: &str) -> Option<String>;

    fn info(&self) -> ExecutorInfo;
}

/// Build the executor selected by the configuration.
pub fn build_executor(config: &Config) -> Result<Arc<dyn Executor>> {
    match &config.executor {
        ExecutorConfig::Compose { .. } => Ok(Arc::new(ComposeExecutor::from_config(config)?)),
        ExecutorConfig::Local { .. } => Ok(Arc::new(LocalExecutor::from_config(config)?)),
        ExecutorConfig::Remote { .. } => Ok(Arc::new(RemoteExecutor::from_config(config)?)),
    }
}
