//! Stack lifecycle commands (compose mode only).

use crate::commands::definition::{ArgSpec, Category, CommandDefinition, OptSpec};
use crate::config::{Config, ExecutorConfig};
use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::exec::{ExecOptions, LogOptions};
use crate::ui;
use rayon::prelude::*;

pub fn commands(config: &Config) -> Vec<CommandDefinition> {
    let ExecutorConfig::Compose {
        services,
        reloadable,
        ..
    } = &config.executor
    else {
        return Vec::new();
    };

    let all_keys: Vec<String> = services.keys().cloned().collect();
    let reload_set = if reloadable.is_empty() {
        all_keys.clone()
    } else {
        reloadable.clone()
    };

    vec![
        CommandDefinition::new("up", "Start the stack (or selected services)")
            .category(Category::Stack)
            .arg(ArgSpec::variadic("services", "Service keys to start"))
            .action(|inv, ctx| {
                let result = ctx.executor()?.start(&inv.args, &ExecOptions::default())?;
                if result.success() {
                    ui::success("Stack is up");
                    Ok(())
                } else {
                    Err(StackctlError::Other(format!(
                        "failed to start: {}",
                        result.stderr.trim()
                    )))
                }
            }),
        CommandDefinition::new("down", "Stop the stack (or selected services)")
            .category(Category::Stack)
            .arg(ArgSpec::variadic("services", "Service keys to stop"))
            .action(|inv, ctx| {
                let result = ctx.executor()?.stop(&inv.args, &ExecOptions::default())?;
                if result.success() {
                    ui::success("Stack stopped");
                    Ok(())
                } else {
                    Err(StackctlError::Other(format!(
                        "failed to stop: {}",
                        result.stderr.trim()
                    )))
                }
            }),
        CommandDefinition::new("restart", "Restart the stack (or selected services)")
            .category(Category::Stack)
            .arg(ArgSpec::variadic("services", "Service keys to restart"))
            .action(|inv, ctx| {
                let result = ctx.executor()?.restart(&inv.args, &ExecOptions::default())?;
                if result.success() {
                    ui::success("Stack restarted");
                    Ok(())
                } else {
                    Err(StackctlError::Other(format!(
                        "failed to restart: {}",
                        result.stderr.trim()
                    )))
                }
            }),
        CommandDefinition::new("reload", "Restart the reloadable services in parallel")
            .category(Category::Stack)
            .action(move |_inv, ctx| reload(ctx, &reload_set)),
        CommandDefinition::new("status", "Show service states")
            .category(Category::Stack)
            .alias("ps")
            .option(OptSpec::value("format", None, "FORMAT", "Output format (json)"))
            .arg(ArgSpec::variadic("services", "Service keys to show"))
            .action(|inv, ctx| {
                let statuses = ctx.executor()?.status(&inv.args)?;
                if inv.value("format") == Some("json") {
                    println!("{}", serde_json::to_string_pretty(&statuses)?);
                    return Ok(());
                }
                if statuses.is_empty() {
                    ui::info("No services reported.");
                    return Ok(());
                }
                for status in &statuses {
                    let resolved = status.resolved.as_deref().unwrap_or("-");
                    ui::keyval(
                        &status.service,
                        &format!("{} ({}) {}", status.state, resolved, status.detail),
                    );
                }
                Ok(())
            }),
        CommandDefinition::new("logs", "Show service logs")
            .category(Category::Stack)
            .option(OptSpec::flag("follow", Some('f'), "Stream logs until interrupted"))
            .option(OptSpec::value("tail", None, "N", "Only the last N lines"))
            .arg(ArgSpec::variadic("services", "Service keys to show"))
            .action(|inv, ctx| {
                let opts = LogOptions {
                    follow: inv.flag("follow"),
                    tail: inv.value("tail").and_then(|t| t.parse().ok()),
                };
                let result = ctx.executor()?.logs(&inv.args, &opts)?;
                if !result.stdout.is_empty() {
                    print!("{}", result.stdout);
                }
                if result.success() {
                    Ok(())
                } else {
                    Err(StackctlError::Other(format!(
                        "logs failed: {}",
                        result.stderr.trim()
                    )))
                }
            }),
    ]
}

/// Restart each reloadable service independently and in parallel; report
/// the aggregate and fail when any restart failed.
fn reload(ctx: &Context, services: &[String]) -> Result<()> {
    if services.is_empty() {
        ui::info("No reloadable services configured.");
        return Ok(());
    }

    let executor = ctx.executor()?;
    let results: Vec<(String, Result<crate::exec::ExecResult>)> = services
        .par_iter()
        .map(|service| {
            let result = executor.restart(
                std::slice::from_ref(service),
                &ExecOptions::default(),
            );
            (service.clone(), result)
        })
        .collect();

    let total = results.len();
    let mut succeeded = 0;
    for (service, result) in results {
        match result {
            Ok(r) if r.success() => {
                succeeded += 1;
                ui::verbose(&format!("restarted {}", service));
            }
            Ok(r) => ui::warning(&format!(
                "{} failed to restart: {}",
                service,
                r.stderr.trim()
            )),
            Err(e) => ui::warning(&format!("{} failed to restart: {}", service, e)),
        }
    }

    if succeeded == total {
        ui::success(&format!("{} of {} services reloaded", succeeded, total));
        Ok(())
    } else {
        Err(StackctlError::Other(format!(
            "{} of {} services reloaded",
            succeeded, total
        )))
    }
}

/// Commands that work on every backend: exec, sh and cp.
pub fn always_on() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("exec", "Run a command in a service")
            .category(Category::Stack)
            .arg(ArgSpec::required("service", "Service key"))
            .arg(ArgSpec::variadic("command", "Command and arguments"))
            .allow_unknown()
            .action(|inv, ctx| {
                let service = inv
                    .arg(0)
                    .ok_or_else(|| StackctlError::Other("exec needs a service".to_string()))?
                    .to_string();
                let mut words: Vec<String> = inv.args.iter().skip(1).cloned().collect();
                words.extend(inv.rest.iter().cloned());
                let Some((program, args)) = words.split_first() else {
                    return Err(StackctlError::Other("exec needs a command".to_string()));
                };
                crate::commands::run_wrapped_tool(ctx, &service, program, args)
            }),
        CommandDefinition::new("cp", "Copy files in or out of the environment")
            .category(Category::Stack)
            .arg(ArgSpec::required("src", "Source (service:path or local path)"))
            .arg(ArgSpec::required("dest", "Destination (service:path or local path)"))
            .action(|inv, ctx| {
                let src = inv.arg(0).unwrap_or_default().to_string();
                let dest = inv.arg(1).unwrap_or_default().to_string();
                copy(ctx, &src, &dest)
            }),
    ]
}

/// `service:path` addresses the execution context; a bare path is local.
fn copy(ctx: &Context, src: &str, dest: &str) -> Result<()> {
    let executor = ctx.executor()?;
    let result = match (split_service(src), split_service(dest)) {
        (None, Some((service, remote))) => {
            executor.copy_into(service, std::path::Path::new(src), remote)?
        }
        (Some((service, remote)), None) => {
            executor.copy_out(service, remote, std::path::Path::new(dest))?
        }
        _ => {
            return Err(StackctlError::Other(
                "exactly one side must be a service:path address".to_string(),
            ));
        }
    };

    if result.success() {
        ui::success(&format!("copied {} -> {}", src, dest));
        Ok(())
    } else {
        Err(StackctlError::Other(format!(
            "copy failed: {}",
            result.stderr.trim()
        )))
    }
}

fn split_service(spec: &str) -> Option<(Option<&str>, &str)> {
    // Windows-style drive letters aside, a colon marks a service address.
    let (service, path) = spec.split_once(':')?;
    if service.is_empty() {
        return Some((None, path));
    }
    Some((Some(service), path))
}
