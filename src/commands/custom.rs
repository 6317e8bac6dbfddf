//! User-declared custom commands.
//!
//! Custom commands are KDL files declaring a name, arguments, options and
//! a shell template run through the executor. Paths come from the project
//! configuration (files or directories, recursed) plus the user-level
//! command directory. A bad file degrades to a warning; it never takes
//! the rest of the CLI down.
//!
//! ```kdl
//! command "deploy" {
//!     description "Build and publish the app image"
//!     alias "ship"
//!     arg "tag" required=#true help="Image tag"
//!     option "registry" value="URL" help="Registry to push to"
//!     service "app"
//!     run "scripts/deploy.sh {tag} {registry}"
//! }
//! ```

use crate::commands::definition::{ArgSpec, Category, CommandDefinition, Invocation, OptSpec};
use crate::config::Config;
use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::exec::ExecOptions;
use crate::ui;
use kdl::{KdlDocument, KdlNode};
use std::path::Path;

/// Load definitions from a configured path. Missing paths and malformed
/// files are warned about and contribute nothing.
pub fn load_path(config: &Config, path: &Path) -> Vec<CommandDefinition> {
    let resolved = config.resolve(path);

    if resolved.is_dir() {
        return load_dir(&resolved);
    }
    if resolved.is_file() {
        return load_file(&resolved);
    }

    ui::warning(&format!(
        "Custom command path not found: {}",
        resolved.display()
    ));
    Vec::new()
}

fn load_dir(dir: &Path) -> Vec<CommandDefinition> {
    let mut defs = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        ui::warning(&format!("Cannot read command directory {}", dir.display()));
        return defs;
    };

    let mut paths: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            defs.extend(load_dir(&path));
        } else if path.extension().is_some_and(|ext| ext == "kdl") {
            defs.extend(load_file(&path));
        }
    }
    defs
}

fn load_file(path: &Path) -> Vec<CommandDefinition> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            ui::warning(&format!("Cannot read {}: {}", path.display(), e));
            return Vec::new();
        }
    };

    match parse_file(&content) {
        Ok(defs) => defs,
        Err(e) => {
            ui::warning(&format!("Skipping {}: {}", path.display(), e));
            Vec::new()
        }
    }
}

/// Parse every valid `command` node; invalid ones are dropped with a
/// warning so one bad definition cannot sink its neighbors.
pub fn parse_file(content: &str) -> Result<Vec<CommandDefinition>> {
    let doc: KdlDocument = content.parse()?;
    let mut defs = Vec::new();

    for node in doc.nodes() {
        if node.name().value() != "command" {
            continue;
        }
        match parse_command(node) {
            Ok(def) => defs.push(def),
            Err(e) => ui::warning(&format!("Dropping custom command: {}", e)),
        }
    }
    Ok(defs)
}

fn parse_command(node: &KdlNode) -> Result<CommandDefinition> {
    let name = first_string(node).ok_or_else(|| {
        StackctlError::ConfigError("command node has no name argument".to_string())
    })?;

    let mut def = CommandDefinition::new(&name, "").category(Category::Custom);
    let mut template: Option<String> = None;
    let mut service: Option<String> = None;
    let mut interactive = false;

    for child in children(node) {
        match child.name().value() {
            "description" => {
                if let Some(about) = first_string(child) {
                    def.about = about;
                }
            }
            "category" => {
                if let Some(label) = first_string(child) {
                    def = def.category(Category::parse(&label));
                }
            }
            "alias" => {
                if let Some(alias) = first_string(child) {
                    def = def.alias(&alias);
                }
            }
            "arg" => {
                let arg_name = first_string(child).ok_or_else(|| {
                    StackctlError::ConfigError(format!("'{}': arg node has no name", name))
                })?;
                let help = prop_string(child, "help").unwrap_or_default();
                let spec = if prop_bool(child, "variadic").unwrap_or(false) {
                    ArgSpec::variadic(&arg_name, &help)
                } else if prop_bool(child, "required").unwrap_or(false) {
                    ArgSpec::required(&arg_name, &help)
                } else {
                    ArgSpec::optional(&arg_name, &help)
                };
                def = def.arg(spec);
            }
            "option" => {
                let opt_name = first_string(child).ok_or_else(|| {
                    StackctlError::ConfigError(format!("'{}': option node has no name", name))
                })?;
                let help = prop_string(child, "help").unwrap_or_default();
                let short = prop_string(child, "short").and_then(|s| s.chars().next());
                let spec = match prop_string(child, "value") {
                    Some(value_name) => OptSpec::value(&opt_name, short, &value_name, &help),
                    None => OptSpec::flag(&opt_name, short, &help),
                };
                def = def.option(spec);
            }
            "service" => service = first_string(child),
            "interactive" => interactive = first_bool(child).unwrap_or(true),
            "run" => template = first_string(child),
            "command" => {
                def = def.subcommand(parse_command(child)?);
            }
            _ => {}
        }
    }

    if let Some(template) = template {
        let arg_specs: Vec<(String, bool)> = def
            .args
            .iter()
            .map(|a| (a.name.clone(), a.variadic))
            .collect();
        let opt_names: Vec<String> = def
            .options
            .iter()
            .filter(|o| o.takes_value)
            .map(|o| o.name.clone())
            .collect();
        def = def.action(move |inv, ctx| {
            run_template(ctx, &template, service.as_deref(), interactive, inv, &arg_specs, &opt_names)
        });
    }

    def.validate()?;
    Ok(def)
}

/// Substitute `{placeholders}`, split the line, and run it through the
/// executor (addressed to the declared service when one is set).
#[allow(clippy::too_many_arguments)]
fn run_template(
    ctx: &Context,
    template: &str,
    service: Option<&str>,
    interactive: bool,
    inv: &Invocation,
    arg_specs: &[(String, bool)],
    opt_names: &[String],
) -> Result<()> {
    let mut line = template.to_string();
    for (index, (name, variadic)) in arg_specs.iter().enumerate() {
        let value = if *variadic {
            inv.args.get(index..).unwrap_or(&[]).join(" ")
        } else {
            inv.args.get(index).cloned().unwrap_or_default()
        };
        line = line.replace(&format!("{{{}}}", name), &value);
    }
    for name in opt_names {
        line = line.replace(
            &format!("{{{}}}", name),
            inv.value(name).unwrap_or_default(),
        );
    }

    let words = shlex::split(&line).ok_or_else(|| {
        StackctlError::ConfigError(format!("invalid quoting in command template: {}", line))
    })?;
    let Some((program, args)) = words.split_first() else {
        return Err(StackctlError::ConfigError(
            "command template is empty".to_string(),
        ));
    };

    let opts = if interactive {
        ExecOptions::interactive()
    } else {
        ExecOptions::default()
    };
    let executor = ctx.executor()?;
    let result = match service {
        Some(service) => executor.run_in_service(service, program, args, &opts)?,
        None => executor.run(program, args, &opts)?,
    };

    if !interactive && !result.stdout.is_empty() {
        print!("{}", result.stdout);
    }
    if result.success() {
        Ok(())
    } else {
        if !result.stderr.is_empty() {
            ui::error(result.stderr.trim());
        }
        Err(StackctlError::Other(format!(
            "{} exited with status {}",
            program, result.exit_code
        )))
    }
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().map(|doc| doc.nodes()).unwrap_or(&[]).iter()
}

fn first_string(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .find_map(|e| e.value().as_string().map(str::to_string))
}

fn first_bool(node: &KdlNode) -> Option<bool> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .find_map(|e| e.value().as_bool())
}

fn prop_string(node: &KdlNode, key: &str) -> Option<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().map(|n| n.value()) == Some(key))
        .find_map(|e| e.value().as_string().map(str::to_string))
}

fn prop_bool(node: &KdlNode, key: &str) -> Option<bool> {
    node.entries()
        .iter()
        .filter(|e| e.name().map(|n| n.value()) == Some(key))
        .find_map(|e| e.value().as_bool())
}

#[cfg(test)]
mod tests;
