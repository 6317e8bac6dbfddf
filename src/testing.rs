//! Test doubles shared by unit tests.

use crate::error::Result;
use crate::exec::{
    ExecOptions, ExecResult, Executor, ExecutorInfo, LogOptions, ServiceStatus, StdinSource,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// One executor call as seen by a provider or command under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub op: String,
    pub service: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub stdin: Option<Vec<u8>>,
}

type Handler = Box<dyn Fn(&RecordedCall) -> Option<ExecResult> + Send + Sync>;

impl std::fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockExecutor")
            .field("calls", &self.calls)
            .field("responses", &self.responses)
            .field("handler", &self.handler.as_ref().map(|_| "<handler>"))
            .field("services", &self.services)
            .field("fail_restart", &self.fail_restart)
            .finish()
    }
}

/// Scriptable in-memory executor: records every call, answers from a
/// response table (keyed by command name) or a custom handler.
#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    responses: Mutex<Vec<(String, ExecResult)>>,
    handler: Option<Handler>,
    services: BTreeMap<String, String>,
    fail_restart: Vec<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, command: &str, result: ExecResult) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((command.to_string(), result));
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RecordedCall) -> Option<ExecResult> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_services(mut self, services: &[(&str, &str)]) -> Self {
        self.services = services
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// Make `restart` fail for the given service keys.
    pub fn fail_restart_of(mut self, services: &[&str]) -> Self {
        self.fail_restart = services.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ok(stdout: &str) -> ExecResult {
        ExecResult {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failing(exit_code: i32, stderr: &str) -> ExecResult {
        ExecResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    fn record_and_answer(
        &self,
        op: &str,
        service: Option<&str>,
        command: &str,
        args: &[String],
        opts: &ExecOptions,
    ) -> ExecResult {
        let stdin = opts.stdin.as_ref().map(|source| match source {
            StdinSource::Bytes(bytes) => bytes.clone(),
            StdinSource::File(path) => std::fs::read(path).unwrap_or_default(),
        });
        let call = RecordedCall {
            op: op.to_string(),
            service: service.map(str::to_string),
            command: command.to_string(),
            args: args.to_vec(),
            env: opts.env.clone(),
            stdin,
        };
        self.calls.lock().unwrap().push(call.clone());

        if let Some(handler) = &self.handler
            && let Some(result) = handler(&call)
        {
            return result;
        }

        self.responses
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| key == command)
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Self::ok(""))
    }
}

impl Executor for MockExecutor {
    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        Ok(self.record_and_answer("run", None, command, args, opts))
    }

    fn run_in_service(
        &self,
        service: &str,
        command: &str,
        args: &[String],
        opts: &ExecOptions,
    ) -> Result<ExecResult> {
        Ok(self.record_and_answer("run_in_service", Some(service), command, args, opts))
    }

    fn start(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        Ok(self.record_and_answer("start", None, "start", services, opts))
    }

    fn stop(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        Ok(self.record_and_answer("stop", None, "stop", services, opts))
    }

    fn restart(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let result = self.record_and_answer("restart", None, "restart", services, opts);
        if services.iter().any(|s| self.fail_restart.contains(s)) {
            return Ok(Self::failing(1, "restart failed"));
        }
        Ok(result)
    }

    fn status(&self, services: &[String]) -> Result<Vec<ServiceStatus>> {
        self.record_and_answer("status", None, "status", services, &ExecOptions::default());
        Ok(Vec::new())
    }

    fn logs(&self, services: &[String], _opts: &LogOptions) -> Result<ExecResult> {
        Ok(self.record_and_answer("logs", None, "logs", services, &ExecOptions::default()))
    }

    fn copy_into(&self, service: Option<&str>, local: &Path, dest: &str) -> Result<ExecResult> {
        Ok(self.record_and_answer(
            "copy_into",
            service,
            "cp",
            &[local.display().to_string(), dest.to_string()],
            &ExecOptions::default(),
        ))
    }

    fn copy_out(&self, service: Option<&str>, src: &str, local: &Path) -> Result<ExecResult> {
        Ok(self.record_and_answer(
            "copy_out",
            service,
            "cp",
            &[src.to_string(), local.display().to_string()],
            &ExecOptions::default(),
        ))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn resolve_service(&self, key: &str) -> Option<String> {
        if self.services.is_empty() {
            Some(key.to_string())
        } else {
            self.services.get(key).cloned()
        }
    }

    fn info(&self) -> ExecutorInfo {
        ExecutorInfo {
            backend: "mock",
            target: "test".to_string(),
            details: Vec::new(),
        }
    }
}
