//! Database command group.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition, OptSpec};
use crate::context::Context;
use crate::error::Result;
use crate::providers::traits::DatabaseProvider;
use crate::ui;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::Arc;

pub fn command() -> CommandDefinition {
    CommandDefinition::new("db", "Database operations")
        .category(Category::Database)
        .subcommand(
            CommandDefinition::new("connect", "Open an interactive database shell")
                .category(Category::Database)
                .action(|_inv, ctx| {
                    with_provider(ctx, |provider| {
                        provider.connect()?;
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("query", "Run a single statement")
                .category(Category::Database)
                .arg(ArgSpec::required("sql", "Statement to run"))
                .action(|inv, ctx| {
                    let sql = inv.arg(0).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        let result = provider.query(&sql)?;
                        if !result.stdout.is_empty() {
                            print!("{}", result.stdout);
                        }
                        if !result.success() {
                            ui::error(result.stderr.trim());
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("backup", "Dump the database to a file")
                .category(Category::Database)
                .option(OptSpec::value("output", Some('o'), "FILE", "Write to this path"))
                .action(|inv, ctx| {
                    let dest = inv.value("output").map(PathBuf::from);
                    with_provider(ctx, move |provider| {
                        let path = provider.backup(dest.as_deref())?;
                        ui::success(&format!("Backup written to {}", path.display()));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("restore", "Load a dump file into the database")
                .category(Category::Database)
                .arg(ArgSpec::required("file", "Dump file to load"))
                .option(OptSpec::flag("yes", Some('y'), "Skip the confirmation prompt"))
                .action(|inv, ctx| {
                    let source = PathBuf::from(inv.arg(0).unwrap_or_default());
                    let yes = inv.flag("yes");
                    with_provider(ctx, move |provider| {
                        if !yes
                            && !ui::prompt_yes_no(&format!(
                                "Overwrite the database from {}?",
                                source.display()
                            ))
                        {
                            ui::info("Restore cancelled.");
                            return Ok(());
                        }
                        provider.restore(&source)?;
                        ui::success("Database restored");
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("snapshot", "Take a quick rollback snapshot")
                .category(Category::Database)
                .arg(ArgSpec::optional("name", "Snapshot name (default: timestamp)"))
                .action(|inv, ctx| {
                    let name = inv.arg(0).map(str::to_string);
                    with_provider(ctx, move |provider| {
                        let path = provider.snapshot(name.as_deref())?;
                        ui::success(&format!("Snapshot written to {}", path.display()));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("rollback", "Restore the most recent snapshot")
                .category(Category::Database)
                .action(|_inv, ctx| {
                    with_provider(ctx, |provider| {
                        let path = provider.rollback()?;
                        ui::success(&format!(
                            "Rolled back from {}",
                            path.file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_default()
                        ));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("size", "Report database and table sizes")
                .category(Category::Database)
                .option(OptSpec::value("format", None, "FORMAT", "Output format (json)"))
                .action(|inv, ctx| {
                    let as_json = inv.value("format") == Some("json");
                    with_provider(ctx, move |provider| {
                        let report = provider.size()?;
                        if as_json {
                            println!("{}", serde_json::to_string_pretty(&report)?);
                            return Ok(());
                        }
                        ui::keyval(&report.database, &report.formatted);
                        for table in &report.tables {
                            ui::indent(&format!("{}  {}", table.name, table.formatted), 1);
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("list", "List backups and snapshots, newest first")
                .category(Category::Database)
                .option(OptSpec::flag("snapshots", None, "Only snapshots"))
                .action(|inv, ctx| {
                    let only_snapshots = inv.flag("snapshots");
                    with_provider(ctx, move |provider| {
                        if !only_snapshots {
                            print_entries("Backups", &provider.list_backups()?);
                        }
                        print_entries("Snapshots", &provider.list_snapshots()?);
                        Ok(())
                    })
                }),
        )
}

/// Run `f` against the configured database provider, or say that none is
/// configured. The "not configured" path performs no subprocess calls.
fn with_provider<F>(ctx: &Context, f: F) -> Result<()>
where
    F: FnOnce(Arc<dyn DatabaseProvider>) -> Result<()>,
{
    match ctx.database()? {
        Some(provider) => f(provider),
        None => {
            ui::info("No database driver configured (database.driver is \"none\").");
            Ok(())
        }
    }
}

fn print_entries(title: &str, entries: &[crate::providers::BackupEntry]) {
    ui::header(title);
    if entries.is_empty() {
        ui::indent("(none)", 1);
        return;
    }
    for entry in entries {
        let modified: DateTime<Local> = entry.modified.into();
        ui::indent(
            &format!(
                "{}  {}  {}",
                modified.format("%Y-%m-%d %H:%M"),
                crate::providers::traits::format_bytes(entry.size),
                entry.file_name()
            ),
            1,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::ProviderRegistry;
    use crate::testing::MockExecutor;

    #[test]
    fn unconfigured_database_prints_notice_without_subprocess_calls() {
        let executor = Arc::new(MockExecutor::new());
        let ctx = Context::with_executor(
            Config::default(),
            ProviderRegistry::with_defaults(),
            executor.clone(),
        );

        with_provider(&ctx, |_| panic!("provider must not resolve")).unwrap();
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn db_command_is_a_parent_with_subcommands_only() {
        let def = command();
        assert!(def.action.is_none());
        assert!(!def.subcommands.is_empty());
        assert!(def.validate().is_ok());
        assert!(def.subcommands.iter().any(|s| s.name == "rollback"));
    }
}
