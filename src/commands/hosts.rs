//! Hosts command group.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition};
use crate::context::Context;
use crate::error::Result;
use crate::providers::traits::{EntryOutcome, HostEntry, HostsProvider};
use crate::ui;
use std::sync::Arc;

pub fn command() -> CommandDefinition {
    CommandDefinition::new("hosts", "Manage project hosts-file entries")
        .category(Category::Hosts)
        .subcommand(
            CommandDefinition::new("add", "Add the configured entries (or one explicit pair)")
                .category(Category::Hosts)
                .arg(ArgSpec::optional("hostname", "Hostname to add"))
                .arg(ArgSpec::optional("ip", "Address for the hostname"))
                .action(|inv, ctx| {
                    let entries = match (inv.arg(0), inv.arg(1)) {
                        (Some(hostname), Some(ip)) => vec![HostEntry {
                            hostname: hostname.to_string(),
                            ip: ip.to_string(),
                        }],
                        _ => configured_entries(ctx),
                    };
                    if entries.is_empty() {
                        ui::info("No hosts entries configured.");
                        return Ok(());
                    }
                    with_provider(ctx, move |provider| {
                        for (entry, outcome) in provider.add_entries(&entries)? {
                            report(&entry.hostname, outcome);
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("rm", "Remove managed entries")
                .category(Category::Hosts)
                .arg(ArgSpec::variadic("hostnames", "Hostnames to remove (default: configured)"))
                .action(|inv, ctx| {
                    let hostnames = if inv.args.is_empty() {
                        configured_entries(ctx)
                            .into_iter()
                            .map(|e| e.hostname)
                            .collect()
                    } else {
                        inv.args.clone()
                    };
                    with_provider(ctx, move |provider| {
                        for (hostname, outcome) in provider.remove_entries(&hostnames)? {
                            report(&hostname, outcome);
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("check", "Verify the configured entries are present")
                .category(Category::Hosts)
                .action(|_inv, ctx| {
                    let entries = configured_entries(ctx);
                    if entries.is_empty() {
                        ui::info("No hosts entries configured.");
                        return Ok(());
                    }
                    with_provider(ctx, move |provider| {
                        for (entry, present) in provider.check_entries(&entries)? {
                            if present {
                                ui::success(&format!("{} -> {}", entry.hostname, entry.ip));
                            } else {
                                ui::warning(&format!("{} missing ({})", entry.hostname, entry.ip));
                            }
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("ls", "List managed entries")
                .category(Category::Hosts)
                .action(|_inv, ctx| {
                    with_provider(ctx, |provider| {
                        let entries = provider.list_entries()?;
                        if entries.is_empty() {
                            ui::info("No managed entries.");
                        }
                        for entry in entries {
                            ui::keyval(&entry.hostname, &entry.ip);
                        }
                        Ok(())
                    })
                }),
        )
}

fn configured_entries(ctx: &Context) -> Vec<HostEntry> {
    ctx.config()
        .hosts
        .entries
        .iter()
        .map(|(hostname, ip)| HostEntry {
            hostname: hostname.clone(),
            ip: ip.clone(),
        })
        .collect()
}

fn report(hostname: &str, outcome: EntryOutcome) {
    match outcome {
        EntryOutcome::Added | EntryOutcome::Updated | EntryOutcome::Removed => {
            ui::success(&format!("{}: {}", hostname, outcome.as_str()));
        }
        EntryOutcome::Skipped | EntryOutcome::NotFound => {
            ui::info(&format!("{}: {}", hostname, outcome.as_str()));
        }
    }
}

fn with_provider<F>(ctx: &Context, f: F) -> Result<()>
where
    F: FnOnce(Arc<dyn HostsProvider>) -> Result<()>,
{
    match ctx.hosts()? {
        Some(provider) => f(provider),
        None => {
            ui::info("Hosts management is not enabled (hosts.manage is off).");
            Ok(())
        }
    }
}
