//! Command registrar.
//!
//! Binds the loaded command definitions to clap, dispatches the parsed
//! invocation through the shared context, and wraps every leaf action
//! with the plugin before/after hooks. A definition with subcommands is
//! registered as a parent that requires one (selecting it alone shows
//! help, never a silent no-op).

use crate::commands::definition::{CommandDefinition, Invocation};
use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::plugins::{HookPoint, PluginManager};
use crate::ui;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use colored::Colorize;

pub const BIN_NAME: &str = "stackctl";

/// Assemble the full clap command tree.
pub fn build_cli(defs: &[CommandDefinition]) -> Command {
    let mut root = Command::new(BIN_NAME)
        .about("Configuration-driven project stack CLI")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print full error details"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Verbose output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Quiet mode"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .action(ArgAction::Set)
                .help("Project configuration file"),
        );

    for def in defs {
        root = root.subcommand(to_clap(def));
    }
    root
}

fn to_clap(def: &CommandDefinition) -> Command {
    let mut cmd = Command::new(def.name.clone()).about(def.about.clone());

    for alias in &def.aliases {
        cmd = cmd.visible_alias(alias.clone());
    }

    for opt in &def.options {
        let mut arg = Arg::new(opt.name.clone())
            .long(opt.name.clone())
            .help(opt.help.clone());
        if let Some(short) = opt.short {
            arg = arg.short(short);
        }
        if opt.takes_value {
            arg = arg.action(ArgAction::Set);
            if let Some(value_name) = &opt.value_name {
                arg = arg.value_name(value_name.clone());
            }
        } else {
            arg = arg.action(ArgAction::SetTrue);
        }
        cmd = cmd.arg(arg);
    }

    for spec in &def.args {
        let mut arg = Arg::new(spec.name.clone()).help(spec.help.clone());
        if spec.variadic {
            arg = arg.num_args(0..);
            if def.allow_unknown {
                // Forward everything, hyphens included, to the action.
                arg = arg.trailing_var_arg(true).allow_hyphen_values(true);
            }
        } else if spec.required {
            arg = arg.required(true);
        }
        cmd = cmd.arg(arg);
    }

    if !def.subcommands.is_empty() {
        // A parent never runs an action of its own.
        cmd = cmd.subcommand_required(true).arg_required_else_help(true);
        for sub in &def.subcommands {
            cmd = cmd.subcommand(to_clap(sub));
        }
    }

    cmd
}

/// Parse the process arguments and dispatch. The returned error is the
/// command's failure; the caller prints it and exits non-zero.
pub fn run(defs: &[CommandDefinition], ctx: &Context, plugins: &PluginManager) -> Result<()> {
    let cli = build_cli(defs);
    let matches = match cli.clone().try_get_matches() {
        Ok(matches) => matches,
        // clap already rendered help/version or the usage error.
        Err(e) => e.exit(),
    };

    match matches.subcommand() {
        None => {
            print_overview(defs);
            Ok(())
        }
        Some(("completions", sub)) => {
            // Needs the assembled parser, so it cannot be a plain action.
            let shell = sub.get_one::<String>("shell").cloned().unwrap_or_default();
            generate_completions(cli, &shell)
        }
        Some((name, sub)) => {
            let def = defs
                .iter()
                .find(|d| d.matches_name(name))
                .ok_or_else(|| StackctlError::Other(format!("unknown command '{}'", name)))?;
            dispatch(def, sub, ctx, plugins)
        }
    }
}

fn dispatch(
    def: &CommandDefinition,
    matches: &ArgMatches,
    ctx: &Context,
    plugins: &PluginManager,
) -> Result<()> {
    if !def.subcommands.is_empty() {
        let Some((sub_name, sub_matches)) = matches.subcommand() else {
            // clap enforces subcommand_required; this is a safety net.
            return Err(StackctlError::Other(format!(
                "'{}' needs a subcommand",
                def.name
            )));
        };
        let sub = def
            .subcommands
            .iter()
            .find(|d| d.matches_name(sub_name))
            .ok_or_else(|| {
                StackctlError::Other(format!("unknown subcommand '{}'", sub_name))
            })?;
        return dispatch(sub, sub_matches, ctx, plugins);
    }

    let invocation = invocation_from(def, matches);
    execute(def, &invocation, ctx, plugins)
}

/// Leaf action wrapper: before hooks, action, after hooks. Hook failures
/// are isolated inside `run_hook`; the action's own error propagates.
fn execute(
    def: &CommandDefinition,
    invocation: &Invocation,
    ctx: &Context,
    plugins: &PluginManager,
) -> Result<()> {
    let action = def
        .action
        .as_ref()
        .ok_or_else(|| StackctlError::Other(format!("'{}' has no action", def.name)))?;

    plugins.run_hook(HookPoint::BeforeCommand, ctx, &def.name);
    let outcome = action(invocation, ctx);
    plugins.run_hook(HookPoint::AfterCommand, ctx, &def.name);
    outcome
}

fn invocation_from(def: &CommandDefinition, matches: &ArgMatches) -> Invocation {
    let mut invocation = Invocation::default();

    for opt in &def.options {
        if opt.takes_value {
            if let Some(value) = matches.get_one::<String>(&opt.name) {
                invocation.set_value(&opt.name, value.clone());
            }
        } else {
            invocation.set_flag(&opt.name, matches.get_flag(&opt.name));
        }
    }

    for spec in &def.args {
        if spec.variadic {
            if let Some(values) = matches.get_many::<String>(&spec.name) {
                invocation.args.extend(values.cloned());
            }
        } else if let Some(value) = matches.get_one::<String>(&spec.name) {
            invocation.args.push(value.clone());
        }
    }

    invocation
}

/// Categorized command overview, printed for a bare invocation. Known
/// categories come first in their fixed order, unranked labels after
/// them alphabetically; commands sort by name within a category.
pub fn print_overview(defs: &[CommandDefinition]) {
    let mut groups: Vec<(&crate::commands::definition::Category, Vec<&CommandDefinition>)> =
        Vec::new();
    for def in defs {
        match groups.iter_mut().find(|(c, _)| *c == &def.category) {
            Some((_, group)) => group.push(def),
            None => groups.push((&def.category, vec![def])),
        }
    }
    groups.sort_by(|(a, _), (b, _)| {
        let rank_a = (a.priority().unwrap_or(usize::MAX), a.label());
        let rank_b = (b.priority().unwrap_or(usize::MAX), b.label());
        rank_a.cmp(&rank_b)
    });

    ui::header(&format!("{} commands", BIN_NAME));
    for (category, mut group) in groups {
        group.sort_by(|a, b| a.name.cmp(&b.name));
        println!("\n{}", category.label().bold());
        for def in group {
            ui::indent(&format!("{:<16} {}", def.name, def.about), 1);
        }
    }
    println!();
    ui::info(&format!(
        "Use `{} <command> --help` for details.",
        BIN_NAME
    ));
}

fn generate_completions(mut cli: Command, shell: &str) -> Result<()> {
    let shell: Shell = shell.parse().map_err(|_| {
        StackctlError::Other(format!(
            "Unsupported shell '{}' (expected bash, zsh, fish, elvish or powershell)",
            shell
        ))
    })?;
    clap_complete::generate(shell, &mut cli, BIN_NAME, &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests;
