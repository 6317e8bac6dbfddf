//! Storage command group.

use crate::commands::definition::{ArgSpec, Category, CommandDefinition};
use crate::context::Context;
use crate::error::Result;
use crate::providers::traits::StorageProvider;
use crate::ui;
use std::path::PathBuf;
use std::sync::Arc;

pub fn command() -> CommandDefinition {
    CommandDefinition::new("storage", "Object storage operations")
        .category(Category::Storage)
        .subcommand(
            CommandDefinition::new("ls", "List objects")
                .category(Category::Storage)
                .arg(ArgSpec::optional("prefix", "Path prefix to list"))
                .action(|inv, ctx| {
                    let prefix = inv.arg(0).map(str::to_string);
                    with_provider(ctx, move |provider| {
                        let listed = provider.list(prefix.as_deref())?;
                        if listed.is_empty() {
                            ui::info("No objects.");
                        }
                        for object in listed {
                            println!("{}", object);
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("put", "Upload a local file")
                .category(Category::Storage)
                .arg(ArgSpec::required("local", "Local file"))
                .arg(ArgSpec::required("dest", "Destination path"))
                .action(|inv, ctx| {
                    let local = PathBuf::from(inv.arg(0).unwrap_or_default());
                    let dest = inv.arg(1).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        provider.upload(&local, &dest)?;
                        ui::success(&format!("Uploaded {} -> {}", local.display(), dest));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("get", "Download an object")
                .category(Category::Storage)
                .arg(ArgSpec::required("src", "Object path"))
                .arg(ArgSpec::optional("local", "Local destination (default: basename)"))
                .action(|inv, ctx| {
                    let src = inv.arg(0).unwrap_or_default().to_string();
                    let local = inv
                        .arg(1)
                        .map(PathBuf::from)
                        .unwrap_or_else(|| {
                            PathBuf::from(src.rsplit('/').next().unwrap_or(&src))
                        });
                    with_provider(ctx, move |provider| {
                        provider.download(&src, &local)?;
                        ui::success(&format!("Downloaded {} -> {}", src, local.display()));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("rm", "Delete an object or prefix")
                .category(Category::Storage)
                .arg(ArgSpec::required("path", "Object path"))
                .action(|inv, ctx| {
                    let path = inv.arg(0).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        provider.delete(&path)?;
                        ui::success(&format!("Deleted {}", path));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("cp", "Copy within the store")
                .category(Category::Storage)
                .arg(ArgSpec::required("src", "Source path"))
                .arg(ArgSpec::required("dest", "Destination path"))
                .action(|inv, ctx| {
                    let src = inv.arg(0).unwrap_or_default().to_string();
                    let dest = inv.arg(1).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        provider.copy(&src, &dest)?;
                        ui::success(&format!("Copied {} -> {}", src, dest));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("mv", "Move/rename within the store")
                .category(Category::Storage)
                .arg(ArgSpec::required("src", "Source path"))
                .arg(ArgSpec::required("dest", "Destination path"))
                .action(|inv, ctx| {
                    let src = inv.arg(0).unwrap_or_default().to_string();
                    let dest = inv.arg(1).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        provider.rename(&src, &dest)?;
                        ui::success(&format!("Moved {} -> {}", src, dest));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("stat", "Show object metadata")
                .category(Category::Storage)
                .arg(ArgSpec::required("path", "Object path"))
                .action(|inv, ctx| {
                    let path = inv.arg(0).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        let info = provider.stat(&path)?;
                        ui::keyval("path", &info.path);
                        ui::keyval("type", &info.kind);
                        ui::keyval(
                            "size",
                            &crate::providers::traits::format_bytes(info.size_bytes),
                        );
                        if let Some(modified) = &info.modified {
                            ui::keyval("modified", modified);
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("exists", "Check whether an object exists")
                .category(Category::Storage)
                .arg(ArgSpec::required("path", "Object path"))
                .action(|inv, ctx| {
                    let path = inv.arg(0).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        if provider.exists(&path)? {
                            ui::success(&format!("{} exists", path));
                        } else {
                            ui::info(&format!("{} does not exist", path));
                        }
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("mkdir", "Create a directory or prefix")
                .category(Category::Storage)
                .arg(ArgSpec::required("path", "Path to create"))
                .action(|inv, ctx| {
                    let path = inv.arg(0).unwrap_or_default().to_string();
                    with_provider(ctx, move |provider| {
                        provider.mkdir(&path)?;
                        ui::success(&format!("Created {}", path));
                        Ok(())
                    })
                }),
        )
        .subcommand(
            CommandDefinition::new("du", "Report storage usage")
                .category(Category::Storage)
                .action(|_inv, ctx| {
                    with_provider(ctx, |provider| {
                        let usage = provider.usage()?;
                        ui::keyval("total", &usage.formatted);
                        if let Some(objects) = usage.objects {
                            ui::keyval("objects", &objects.to_string());
                        }
                        Ok(())
                    })
                }),
        )
}

fn with_provider<F>(ctx: &Context, f: F) -> Result<()>
where
    F: FnOnce(Arc<dyn StorageProvider>) -> Result<()>,
{
    match ctx.storage()? {
        Some(provider) => f(provider),
        None => {
            ui::info("No storage driver configured (storage.driver is \"none\").");
            Ok(())
        }
    }
}
