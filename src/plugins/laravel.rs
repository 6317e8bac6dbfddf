//! Laravel plugin: artisan helpers.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition, OptSpec};
use crate::commands::run_wrapped_tool;
use crate::error::Result;
use crate::plugins::{PluginHooks, PluginManifest};

const APP_SERVICE: &str = "app";

pub(super) fn manifest() -> Result<PluginManifest> {
    Ok(PluginManifest {
        name: "laravel".to_string(),
        version: "1.0.3".to_string(),
        about: "artisan helpers for Laravel projects".to_string(),
        commands,
        config_keys: vec!["database.name", "database.service"],
        hooks: PluginHooks::default(),
    })
}

fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("artisan", "Run artisan with arbitrary arguments")
            .category(Category::Plugin)
            .alias("art")
            .arg(ArgSpec::variadic("args", "Arguments forwarded to artisan"))
            .allow_unknown()
            .action(|inv, ctx| {
                let mut args = vec!["artisan".to_string()];
                args.extend(inv.args.iter().cloned());
                args.extend(inv.rest.iter().cloned());
                run_wrapped_tool(ctx, APP_SERVICE, "php", &args)
            }),
        CommandDefinition::new("tinker", "Open an interactive tinker shell")
            .category(Category::Plugin)
            .action(|_inv, ctx| {
                run_wrapped_tool(
                    ctx,
                    APP_SERVICE,
                    "php",
                    &["artisan".to_string(), "tinker".to_string()],
                )
            }),
        CommandDefinition::new("migrate", "Run database migrations")
            .category(Category::Plugin)
            .option(OptSpec::flag("fresh", None, "Drop all tables and re-run"))
            .option(OptSpec::flag("seed", None, "Seed the database afterwards"))
            .action(|inv, ctx| {
                let mut args = vec!["artisan".to_string()];
                if inv.flag("fresh") {
                    args.push("migrate:fresh".to_string());
                } else {
                    args.push("migrate".to_string());
                }
                if inv.flag("seed") {
                    args.push("--seed".to_string());
                }
                run_wrapped_tool(ctx, APP_SERVICE, "php", &args)
            }),
        CommandDefinition::new("queue-work", "Process jobs from the queue")
            .category(Category::Plugin)
            .option(OptSpec::value("queue", None, "NAME", "Queue to consume"))
            .action(|inv, ctx| {
                let mut args = vec!["artisan".to_string(), "queue:work".to_string()];
                if let Some(queue) = inv.value("queue") {
                    args.push(format!("--queue={}", queue));
                }
                run_wrapped_tool(ctx, APP_SERVICE, "php", &args)
            }),
    ]
}
