//! Always-on informational commands.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition, OptSpec};
use crate::config::Config;
use crate::plugins::PluginManager;
use crate::ui;
use std::collections::BTreeMap;

pub fn commands(config: &Config, plugins: &PluginManager) -> Vec<CommandDefinition> {
    let loaded = plugins.loaded_names();
    let failed: BTreeMap<String, String> = plugins.failed().clone();
    let drivers_hint = (
        config.database.driver.clone(),
        config.storage.driver.clone(),
        config.hosts.manage,
    );

    vec![
        CommandDefinition::new("info", "Show the resolved project setup")
            .category(Category::Other("General".to_string()))
            .option(OptSpec::value("format", None, "FORMAT", "Output format (json)"))
            .action(move |inv, ctx| {
                let config = ctx.config();
                let executor_info = ctx.executor().map(|e| e.info());
                let (database, storage, hosts_managed) = &drivers_hint;

                if inv.value("format") == Some("json") {
                    let executor = match &executor_info {
                        Ok(info) => serde_json::to_value(info)?,
                        Err(e) => serde_json::json!({ "error": e.to_string() }),
                    };
                    let payload = serde_json::json!({
                        "project": &config.project,
                        "root": config.root.display().to_string(),
                        "executor": executor,
                        "database": database,
                        "storage": storage,
                        "hosts": hosts_managed,
                        "plugins": { "loaded": &loaded, "failed": &failed },
                    });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                    return Ok(());
                }

                ui::header(&config.project);
                ui::keyval("root", &config.root.display().to_string());
                match &executor_info {
                    Ok(info) => {
                        ui::keyval("executor", &format!("{} ({})", info.backend, info.target));
                        for (key, value) in &info.details {
                            ui::indent(&format!("{}: {}", key, value), 1);
                        }
                    }
                    Err(e) => ui::warning(&format!("executor unavailable: {}", e)),
                }
                ui::keyval("database", database);
                ui::keyval("storage", storage);
                ui::keyval("hosts", if *hosts_managed { "managed" } else { "off" });
                ui::keyval(
                    "registered drivers",
                    &format!(
                        "database [{}], storage [{}], hosts [{}]",
                        ctx.registry().database_drivers().join(", "),
                        ctx.registry().storage_drivers().join(", "),
                        ctx.registry().hosts_drivers().join(", "),
                    ),
                );
                if loaded.is_empty() {
                    ui::keyval("plugins", "(none)");
                } else {
                    ui::keyval("plugins", &loaded.join(", "));
                }
                for (name, reason) in &failed {
                    ui::warning(&format!("plugin {} failed: {}", name, reason));
                }
                Ok(())
            }),
        CommandDefinition::new("completions", "Generate shell completions")
            .category(Category::Other("General".to_string()))
            .arg(ArgSpec::required("shell", "bash, zsh, fish, elvish or powershell"))
            // The generator needs the assembled parser, so the registrar
            // intercepts this command before normal dispatch.
            .action(|_inv, _ctx| Ok(())),
    ]
}
