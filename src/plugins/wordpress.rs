//! WordPress plugin: wp-cli helpers.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition};
use crate::commands::run_wrapped_tool;
use crate::context::Context;
use crate::error::Result;
use crate::plugins::{PluginHooks, PluginManifest};
use crate::ui;

/// Service key wp-cli runs under.
const APP_SERVICE: &str = "app";

pub(super) fn manifest() -> Result<PluginManifest> {
    Ok(PluginManifest {
        name: "wordpress".to_string(),
        version: "1.2.0".to_string(),
        about: "wp-cli helpers for WordPress projects".to_string(),
        commands,
        config_keys: vec!["database.name", "database.user", "database.service"],
        hooks: PluginHooks {
            before_command: Some(warn_when_database_unset),
            after_command: None,
        },
    })
}

fn commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("wp", "Run wp-cli with arbitrary arguments")
            .category(Category::Plugin)
            .arg(ArgSpec::variadic("args", "Arguments forwarded to wp"))
            .allow_unknown()
            .action(|inv, ctx| {
                let mut args = inv.args.clone();
                args.extend(inv.rest.iter().cloned());
                run_wrapped_tool(ctx, APP_SERVICE, "wp", &args)
            }),
        CommandDefinition::new("cron-run", "Run all due WordPress cron events")
            .category(Category::Plugin)
            .action(|_inv, ctx| {
                run_wrapped_tool(
                    ctx,
                    APP_SERVICE,
                    "wp",
                    &[
                        "cron".to_string(),
                        "event".to_string(),
                        "run".to_string(),
                        "--due-now".to_string(),
                    ],
                )
            }),
        CommandDefinition::new("search-replace", "Search and replace through the database")
            .category(Category::Plugin)
            .arg(ArgSpec::required("search", "String to search for"))
            .arg(ArgSpec::required("replace", "Replacement string"))
            .action(|inv, ctx| {
                let search = inv.arg(0).unwrap_or_default().to_string();
                let replace = inv.arg(1).unwrap_or_default().to_string();
                run_wrapped_tool(
                    ctx,
                    APP_SERVICE,
                    "wp",
                    &["search-replace".to_string(), search, replace],
                )
            }),
    ]
}

/// Database-touching commands are pointless with no driver configured;
/// say so before the tool fails obscurely.
fn warn_when_database_unset(ctx: &Context, command: &str) -> Result<()> {
    let touches_db = matches!(command, "search-replace" | "cron-run");
    if touches_db && !ctx.config().database.enabled() {
        ui::warning("No database driver is configured; this command may fail.");
    }
    Ok(())
}
