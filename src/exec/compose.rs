//! Compose backend: drives a `docker compose` stack.

use crate::config::{Config, ExecutorConfig};
use crate::error::{Result, StackctlError};
use crate::exec::process;
use crate::exec::{ExecOptions, ExecResult, Executor, ExecutorInfo, LogOptions, ServiceStatus};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Conventional compose file names probed at the project root, in
/// priority order, when no explicit path is configured.
const COMPOSE_CANDIDATES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yml",
    "docker-compose.yaml",
];

#[derive(Debug)]
pub struct ComposeExecutor {
    project_root: PathBuf,
    compose_file: PathBuf,
    /// Service key -> compose service name.
    services: BTreeMap<String, String>,
    /// Services declared in the compose file itself (best effort).
    declared: Vec<String>,
}

impl ComposeExecutor {
    pub fn from_config(config: &Config) -> Result<Self> {
        let ExecutorConfig::Compose {
            compose_file,
            services,
            ..
        } = &config.executor
        else {
            return Err(StackctlError::ConfigError(
                "executor mode is not compose".to_string(),
            ));
        };

        let compose_file = resolve_compose_file(config, compose_file.as_deref())?;
        let declared = declared_services(&compose_file);

        Ok(Self {
            project_root: config.root.clone(),
            compose_file,
            services: services.clone(),
            declared,
        })
    }

    fn compose(&self) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .current_dir(&self.project_root);
        cmd
    }

    /// Resolve a service key or fail with the known keys listed.
    fn resolve_required(&self, key: &str) -> Result<String> {
        self.resolve_service(key)
            .ok_or_else(|| StackctlError::ServiceNotMapped {
                service: key.to_string(),
                known: self.services.keys().cloned().collect(),
            })
    }

    fn resolve_all(&self, keys: &[String]) -> Result<Vec<String>> {
        keys.iter().map(|k| self.resolve_required(k)).collect()
    }

    fn run_compose(&self, args: Vec<String>, opts: &ExecOptions) -> Result<ExecResult> {
        let mut cmd = self.compose();
        cmd.args(&args);
        for (key, value) in &opts.env {
            cmd.env(key, value);
        }
        if opts.interactive {
            Ok(process::interactive(&mut cmd))
        } else {
            Ok(process::capture(&mut cmd, opts.stdin.as_ref()))
        }
    }
}

impl Executor for ComposeExecutor {
    fn run(&self, command: &str, args: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut cmd = Command::new(command);
        cmd.args(args).current_dir(&self.project_root);
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
        let name = self.resolve_required(service)?;

        let mut compose_args = vec!["exec".to_string()];
        if !opts.interactive {
            // Without a TTY `exec` needs -T so stdin piping works.
            compose_args.push("-T".to_string());
        }
        for (key, value) in &opts.env {
            compose_args.push("-e".to_string());
            compose_args.push(format!("{}={}", key, value));
        }
        compose_args.push(name);
        compose_args.push(command.to_string());
        compose_args.extend(args.iter().cloned());

        // Env already passed via -e; don't also set it on the client.
        let client_opts = ExecOptions {
            env: Vec::new(),
            ..opts.clone()
        };
        self.run_compose(compose_args, &client_opts)
    }

    fn start(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut args = vec!["up".to_string(), "-d".to_string()];
        args.extend(self.resolve_all(services)?);
        self.run_compose(args, opts)
    }

    fn stop(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut args = vec!["stop".to_string()];
        args.extend(self.resolve_all(services)?);
        self.run_compose(args, opts)
    }

    fn restart(&self, services: &[String], opts: &ExecOptions) -> Result<ExecResult> {
        let mut args = vec!["restart".to_string()];
        args.extend(self.resolve_all(services)?);
        self.run_compose(args, opts)
    }

    fn status(&self, services: &[String]) -> Result<Vec<ServiceStatus>> {
        let result = self.run_compose(
            vec![
                "ps".to_string(),
                "--all".to_string(),
                "--format".to_string(),
                "json".to_string(),
            ],
            &ExecOptions::default(),
        )?;

        if !result.success() {
            // The stack being down is still a status, not an error.
            return Ok(self
                .services
                .keys()
                .filter(|k| services.is_empty() || services.contains(k))
                .map(|key| ServiceStatus {
                    service: key.clone(),
                    resolved: self.resolve_service(key),
                    state: "unknown".to_string(),
                    detail: result.stderr.trim().to_string(),
                })
                .collect());
        }

        // `docker compose ps --format json` emits one JSON object per
        // line; older releases emit a single array instead.
        let mut records = Vec::new();
        for line in result.stdout.lines().filter(|l| !l.trim().is_empty()) {
            let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };
            match value {
                serde_json::Value::Array(items) => records.extend(items),
                other => records.push(other),
            }
        }

        let mut statuses = Vec::new();
        for value in records {
            let name = value
                .get("Service")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let key = self
                .services
                .iter()
                .find(|(_, v)| **v == name)
                .map(|(k, _)| k.clone())
                .unwrap_or_else(|| name.clone());
            if !services.is_empty() && !services.contains(&key) {
                continue;
            }
            statuses.push(ServiceStatus {
                service: key,
                resolved: Some(name),
                state: value
                    .get("State")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                detail: value
                    .get("Status")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(statuses)
    }

    fn logs(&self, services: &[String], opts: &LogOptions) -> Result<ExecResult> {
        let mut args = vec!["logs".to_string()];
        if opts.follow {
            args.push("--follow".to_string());
        }
        if let Some(tail) = opts.tail {
            args.push("--tail".to_string());
            args.push(tail.to_string());
        }
        args.extend(self.resolve_all(services)?);

        let exec_opts = ExecOptions {
            interactive: opts.follow,
            ..ExecOptions::default()
        };
        self.run_compose(args, &exec_opts)
    }

    fn copy_into(&self, service: Option<&str>, local: &Path, dest: &str) -> Result<ExecResult> {
        let service = service.ok_or_else(|| {
            StackctlError::ConfigError("copying in compose mode requires a service".to_string())
        })?;
        let name = self.resolve_required(service)?;
        self.run_compose(
            vec![
                "cp".to_string(),
                local.display().to_string(),
                format!("{}:{}", name, dest),
            ],
            &ExecOptions::default(),
        )
    }

    fn copy_out(&self, service: Option<&str>, src: &str, local: &Path) -> Result<ExecResult> {
        let service = service.ok_or_else(|| {
            StackctlError::ConfigError("copying in compose mode requires a service".to_string())
        })?;
        let name = self.resolve_required(service)?;
        self.run_compose(
            vec![
                "cp".to_string(),
                format!("{}:{}", name, src),
                local.display().to_string(),
            ],
            &ExecOptions::default(),
        )
    }

    fn is_available(&self) -> bool {
        which::which("docker").is_ok() && self.compose_file.is_file()
    }

    fn resolve_service(&self, key: &str) -> Option<String> {
        self.services.get(key).cloned()
    }

    fn info(&self) -> ExecutorInfo {
        let mut details = vec![(
            "compose-file".to_string(),
            self.compose_file.display().to_string(),
        )];
        for (key, name) in &self.services {
            details.push((format!("service.{}", key), name.clone()));
        }
        if !self.declared.is_empty() {
            details.push(("declared".to_string(), self.declared.join(", ")));
        }
        ExecutorInfo {
            backend: "compose",
            target: self.compose_file.display().to_string(),
            details,
        }
    }
}

fn resolve_compose_file(config: &Config, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        let resolved = config.resolve(path);
        if resolved.is_file() {
            return Ok(resolved);
        }
        return Err(StackctlError::ConfigError(format!(
            "compose file not found at {}",
            resolved.display()
        )));
    }

    for candidate in COMPOSE_CANDIDATES {
        let path = config.root.join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }

    Err(StackctlError::ConfigError(format!(
        "no compose file found at {} (tried {})",
        config.root.display(),
        COMPOSE_CANDIDATES.join(", ")
    )))
}

/// Best-effort list of services declared in the compose file.
fn declared_services(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(value) = serde_yml::from_str::<serde_yml::Value>(&content) else {
        return Vec::new();
    };
    value
        .get("services")
        .and_then(|s| s.as_mapping())
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
