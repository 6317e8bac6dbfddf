pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod error_suggestions;
pub mod exec;
pub mod plugins;
pub mod providers;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::error_suggestions::ErrorSuggestions;
use crate::plugins::PluginManager;
use crate::providers::ProviderRegistry;
use std::path::{Path, PathBuf};
use std::process::exit;

/// Run the stackctl CLI entrypoint.
pub fn run_cli() {
    // 0. Color handling first, before any output.
    ui::init_colors();

    // 1. Signal handling: mark cancellation; the running external process
    //    owns the terminal and handles the signal itself.
    ctrlc::set_handler(move || {
        eprintln!();
        ui::mark_interrupted();
        ui::warning("Operation cancelled by user.");
    })
    .expect("Error setting Ctrl-C handler");

    // 2. Global flags are needed before the command tree exists (the
    //    tree depends on the configuration, which --config selects), so
    //    pre-scan them; clap re-parses them later for help output.
    let argv: Vec<String> = std::env::args().collect();
    ui::set_debug(has_flag(&argv, "--debug"));
    ui::set_quiet(has_flag(&argv, "--quiet") || has_flag(&argv, "-q"));
    ui::set_verbose(has_flag(&argv, "--verbose") || has_flag(&argv, "-v"));

    // 3. Configuration.
    let config = match load_config(&argv) {
        Ok(config) => config,
        Err(e) => {
            ui::error(&e.to_string());
            if let Some(hint) = e.suggestion() {
                ui::hint(&hint);
            }
            exit(1);
        }
    };

    // 4. Plugins, registry, context, commands.
    let mut plugins = PluginManager::new();
    plugins.load_plugins(&config.plugins);

    let ctx = Context::new(config, ProviderRegistry::with_defaults());
    let defs = commands::loader::load_commands(ctx.config(), &plugins);

    // 5. Dispatch; any command error exits non-zero.
    if let Err(e) = commands::registrar::run(&defs, &ctx, &plugins) {
        ui::error(&e.to_string());
        if let Some(hint) = e.suggestion() {
            ui::hint(&hint);
        }
        if ui::is_debug() {
            eprintln!("{:?}", e);
        }
        exit(1);
    }
}

/// Resolve the configuration: an explicit --config path must exist; a
/// failed upward search falls back to defaults so `--help`, the overview
/// and `completions` keep working outside a project.
fn load_config(argv: &[String]) -> Result<Config> {
    if let Some(path) = flag_value(argv, "--config") {
        return config::load_file(Path::new(&path));
    }

    match config::discover(None) {
        Ok(config) => Ok(config),
        Err(StackctlError::ConfigNotFound { .. }) => {
            ui::verbose("No stackctl.kdl found; running with defaults.");
            Ok(Config {
                root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                ..Config::default()
            })
        }
        Err(e) => Err(e),
    }
}

fn has_flag(argv: &[String], flag: &str) -> bool {
    argv.iter().any(|a| a == flag)
}

fn flag_value(argv: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{}=", flag);
    for (index, arg) in argv.iter().enumerate() {
        if arg == flag {
            return argv.get(index + 1).cloned();
        }
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.to_string());
        }
    }
    None
}
