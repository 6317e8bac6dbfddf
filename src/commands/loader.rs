//! Command discovery and aggregation.
//!
//! Stages append, never replace: (1) always-on built-ins, (2) groups
//! gated by configuration, (3) commands from every loaded plugin,
//! (4) user-declared custom command paths plus the user-level command
//! directory. Invalid definitions and duplicate names are dropped with a
//! warning; a bad unit never aborts the load.

use crate::commands::definition::CommandDefinition;
use crate::commands::{custom, db, hosts, meta, stack, storage};
use crate::config::Config;
use crate::plugins::PluginManager;
use crate::ui;
use directories::ProjectDirs;
use std::path::PathBuf;

pub fn load_commands(config: &Config, plugins: &PluginManager) -> Vec<CommandDefinition> {
    let mut defs: Vec<CommandDefinition> = Vec::new();

    // Stage 1: always-on built-ins.
    for def in meta::commands(config, plugins) {
        push(&mut defs, def, "built-in");
    }
    for def in stack::always_on() {
        push(&mut defs, def, "built-in");
    }

    // Stage 2: gated groups.
    if config.groups.stack && config.executor.is_compose() {
        for def in stack::commands(config) {
            push(&mut defs, def, "stack group");
        }
    }
    if config.groups.database && config.database.enabled() {
        push(&mut defs, db::command(), "database group");
    }
    if config.groups.storage && config.storage.enabled() {
        push(&mut defs, storage::command(), "storage group");
    }
    if config.groups.hosts && config.hosts.manage {
        push(&mut defs, hosts::command(), "hosts group");
    }

    // Stage 3: plugin commands.
    for (plugin, commands) in plugins.all_commands() {
        for def in commands {
            push(&mut defs, def, &format!("plugin '{}'", plugin));
        }
    }

    // Stage 4: custom command paths, then the user-level directory.
    for path in &config.custom_commands {
        for def in custom::load_path(config, path) {
            push(&mut defs, def, &format!("custom path '{}'", path.display()));
        }
    }
    if let Some(user_dir) = user_commands_dir()
        && user_dir.is_dir()
    {
        for def in custom::load_path(config, &user_dir) {
            push(&mut defs, def, "user commands");
        }
    }

    defs
}

/// Validate and append, keeping the earlier definition on a name clash.
fn push(defs: &mut Vec<CommandDefinition>, def: CommandDefinition, source: &str) {
    if let Err(e) = def.validate() {
        ui::warning(&format!("Skipping invalid command from {}: {}", source, e));
        return;
    }
    if let Some(existing) = defs.iter().find(|d| d.name == def.name) {
        ui::warning(&format!(
            "Skipping duplicate command '{}' from {} (already provided)",
            existing.name, source
        ));
        return;
    }
    defs.push(def);
}

/// `~/.config/stackctl/commands`, shared across projects.
fn user_commands_dir() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("io", "stackctl", "stackctl")?;
    Some(dirs.config_dir().join("commands"))
}
