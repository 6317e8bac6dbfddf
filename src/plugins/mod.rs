//! Plugin manager.
//!
//! Plugins are optional bundles of commands, configuration keys, and
//! lifecycle hooks, typically framework-specific. Built-in plugins live
//! in a descriptor table; loading resolves a descriptor to its manifest.
//! Per plugin the lifecycle is unloaded -> loaded, or unloaded -> failed
//! (warned, never fatal to the rest of the startup). Command sets are
//! materialized lazily on first request and cached.

mod laravel;
mod wordpress;

use crate::commands::definition::CommandDefinition;
use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::ui;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Lifecycle hook signature: the context and the command name.
pub type HookFn = fn(&Context, &str) -> Result<()>;

#[derive(Clone, Copy, Default)]
pub struct PluginHooks {
    pub before_command: Option<HookFn>,
    pub after_command: Option<HookFn>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HookPoint {
    BeforeCommand,
    AfterCommand,
}

/// A loaded plugin's manifest.
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub about: String,
    /// Lazy command provider; only invoked when the commands are first
    /// requested, not at load time.
    pub commands: fn() -> Vec<CommandDefinition>,
    /// Configuration keys the plugin reads, for diagnostics.
    pub config_keys: Vec<&'static str>,
    pub hooks: PluginHooks,
}

/// Entry in the built-in plugin table.
pub struct PluginDescriptor {
    pub name: &'static str,
    pub load: fn() -> Result<PluginManifest>,
}

/// The built-in plugin table. The startup discovery pass resolves enabled
/// names against it.
pub fn builtin_descriptors() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor {
            name: "wordpress",
            load: wordpress::manifest,
        },
        PluginDescriptor {
            name: "laravel",
            load: laravel::manifest,
        },
    ]
}

struct LoadedPlugin {
    manifest: PluginManifest,
    commands: OnceLock<Vec<CommandDefinition>>,
}

#[derive(Default)]
pub struct PluginManager {
    descriptors: Vec<PluginDescriptor>,
    loaded: Vec<LoadedPlugin>,
    failed: BTreeMap<String, String>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            descriptors: builtin_descriptors(),
            loaded: Vec::new(),
            failed: BTreeMap::new(),
        }
    }

    /// A manager with a custom descriptor table (tests, embedding).
    pub fn with_descriptors(descriptors: Vec<PluginDescriptor>) -> Self {
        Self {
            descriptors,
            loaded: Vec::new(),
            failed: BTreeMap::new(),
        }
    }

    /// Load each named plugin independently; one failure is warned and
    /// must not prevent the others from loading.
    pub fn load_plugins(&mut self, names: &[String]) {
        for name in names {
            if let Err(e) = self.load_plugin(name) {
                self.failed.insert(name.clone(), e.to_string());
                ui::warning(&format!("Plugin '{}' failed to load: {}", name, e));
            }
        }
    }

    /// Idempotent: an already-loaded plugin is left alone.
    pub fn load_plugin(&mut self, name: &str) -> Result<()> {
        if self.is_loaded(name) {
            return Ok(());
        }

        let descriptor = self
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| {
                StackctlError::PluginError(format!(
                    "unknown plugin '{}' (available: {})",
                    name,
                    self.descriptors
                        .iter()
                        .map(|d| d.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;

        let manifest = (descriptor.load)()?;
        validate_manifest(name, &manifest)?;

        self.loaded.push(LoadedPlugin {
            manifest,
            commands: OnceLock::new(),
        });
        Ok(())
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|p| p.manifest.name == name)
    }

    pub fn loaded_names(&self) -> Vec<String> {
        self.loaded.iter().map(|p| p.manifest.name.clone()).collect()
    }

    pub fn failed(&self) -> &BTreeMap<String, String> {
        &self.failed
    }

    /// A plugin's commands, materializing them on first request.
    pub fn commands(&self, name: &str) -> Option<Vec<CommandDefinition>> {
        let plugin = self.loaded.iter().find(|p| p.manifest.name == name)?;
        Some(
            plugin
                .commands
                .get_or_init(plugin.manifest.commands)
                .clone(),
        )
    }

    /// Commands of every loaded plugin, in load order.
    pub fn all_commands(&self) -> Vec<(String, Vec<CommandDefinition>)> {
        self.loaded
            .iter()
            .map(|plugin| {
                (
                    plugin.manifest.name.clone(),
                    plugin.commands.get_or_init(plugin.manifest.commands).clone(),
                )
            })
            .collect()
    }

    /// Invoke the named hook on every loaded plugin. A hook failure is
    /// isolated: warned, never aborts the command or the CLI.
    pub fn run_hook(&self, point: HookPoint, ctx: &Context, command: &str) {
        for plugin in &self.loaded {
            let hook = match point {
                HookPoint::BeforeCommand => plugin.manifest.hooks.before_command,
                HookPoint::AfterCommand => plugin.manifest.hooks.after_command,
            };
            if let Some(hook) = hook
                && let Err(e) = hook(ctx, command)
            {
                ui::warning(&format!(
                    "Plugin '{}' {:?} hook failed: {}",
                    plugin.manifest.name, point, e
                ));
            }
        }
    }

    pub fn manifest(&self, name: &str) -> Option<&PluginManifest> {
        self.loaded
            .iter()
            .find(|p| p.manifest.name == name)
            .map(|p| &p.manifest)
    }
}

/// The only structural validation done at load time: a manifest must
/// carry a name and a version. Hook and command shapes are checked
/// lazily when actually invoked.
fn validate_manifest(source: &str, manifest: &PluginManifest) -> Result<()> {
    if manifest.name.trim().is_empty() {
        return Err(StackctlError::PluginError(format!(
            "manifest from '{}' is missing a name",
            source
        )));
    }
    if manifest.version.trim().is_empty() {
        return Err(StackctlError::PluginError(format!(
            "manifest '{}' is missing a version",
            manifest.name
        )));
    }
    Ok(())
}
