//! Project configuration loading.
//!
//! Finds `stackctl.kdl` by walking upward from the working directory and
//! maps it onto [`Config`]. The mapping is deliberately thin: the core
//! trusts the loaded record and fails fast only on fields it actually
//! dereferences.

use crate::config::types::{
    Config, DatabaseConfig, ExecutorConfig, GroupToggles, HostsConfig, StorageConfig, default_shell,
};
use crate::config::CONFIG_FILE;
use crate::error::{Result, StackctlError};
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Locate and load the project configuration.
///
/// Resolution order: explicit path, `STACKCTL_CONFIG`, then an upward
/// walk from the working directory.
pub fn discover(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_file(path);
    }

    if let Ok(path) = std::env::var("STACKCTL_CONFIG")
        && !path.is_empty()
    {
        return load_file(Path::new(&path));
    }

    let start = std::env::current_dir().map_err(StackctlError::StdIoError)?;
    let mut dir = start.as_path();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return load_file(&candidate);
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => {
                return Err(StackctlError::ConfigNotFound {
                    file: CONFIG_FILE.to_string(),
                    start,
                });
            }
        }
    }
}

pub fn load_file(path: &Path) -> Result<Config> {
    if !path.is_file() {
        return Err(StackctlError::ConfigNotFound {
            file: path.display().to_string(),
            start: std::env::current_dir().unwrap_or_default(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| StackctlError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let root = path
        .parent()
        .map(Path::to_path_buf)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."));

    parse_config(&content, root)
}

pub fn parse_config(content: &str, root: PathBuf) -> Result<Config> {
    let doc: KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        let err_msg = e.to_string();
        let hint = if err_msg.contains("unexpected token") {
            "\nHint: Check for missing quotes, unmatched brackets, or invalid characters."
        } else if err_msg.contains("unexpected end of file") {
            "\nHint: You might be missing a closing brace '}'."
        } else {
            ""
        };
        StackctlError::ConfigError(format!("KDL parsing error: {}{}", err_msg, hint))
    })?;

    let mut config = Config {
        root,
        ..Config::default()
    };

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(name) = first_string(node) {
                    config.project = name;
                }
            }
            "executor" => config.executor = parse_executor(node)?,
            "database" => config.database = parse_database(node),
            "storage" => config.storage = parse_storage(node),
            "hosts" => config.hosts = parse_hosts(node),
            "plugins" | "plugin" => extract_strings(node, &mut config.plugins),
            "groups" => config.groups = parse_groups(node),
            "commands" | "command-paths" => {
                let mut raw = Vec::new();
                extract_strings(node, &mut raw);
                config.custom_commands.extend(raw.into_iter().map(PathBuf::from));
            }
            "description" => {}
            _ => {}
        }
    }

    Ok(config)
}

fn parse_executor(node: &KdlNode) -> Result<ExecutorConfig> {
    let mode = first_string(node).unwrap_or_else(|| "local".to_string());

    match mode.as_str() {
        "compose" => {
            let mut compose_file = None;
            let mut services = BTreeMap::new();
            let mut reloadable = Vec::new();

            for child in children(node) {
                match child.name().value() {
                    "compose-file" => {
                        compose_file = first_string(child).map(PathBuf::from);
                    }
                    "services" => {
                        for svc in children(child) {
                            let key = svc.name().value().to_string();
                            if let Some(name) = first_string(svc) {
                                services.insert(key, name);
                            }
                        }
                    }
                    "reloadable" => extract_strings(child, &mut reloadable),
                    _ => {}
                }
            }

            Ok(ExecutorConfig::Compose {
                compose_file,
                services,
                reloadable,
            })
        }
        "local" => {
            let mut shell = default_shell();
            let mut working_dir = None;
            for child in children(node) {
                match child.name().value() {
                    "shell" => {
                        if let Some(s) = first_string(child) {
                            shell = s;
                        }
                    }
                    "working-dir" => working_dir = first_string(child).map(PathBuf::from),
                    _ => {}
                }
            }
            Ok(ExecutorConfig::Local { shell, working_dir })
        }
        "remote" => {
            let mut host = None;
            let mut user = None;
            let mut port = None;
            let mut identity = None;
            let mut working_dir = None;
            for child in children(node) {
                match child.name().value() {
                    "host" => host = first_string(child),
                    "user" => user = first_string(child),
                    "port" => port = first_integer(child).map(|p| p as u16),
                    "identity" => identity = first_string(child).map(PathBuf::from),
                    "working-dir" => working_dir = first_string(child),
                    _ => {}
                }
            }
            let host = host.ok_or_else(|| {
                StackctlError::ConfigError(
                    "executor \"remote\" requires a host setting".to_string(),
                )
            })?;
            Ok(ExecutorConfig::Remote {
                host,
                user,
                port,
                identity,
                working_dir,
            })
        }
        other => Err(StackctlError::ConfigError(format!(
            "Unknown executor mode '{}'. Expected compose, local or remote.",
            other
        ))),
    }
}

fn parse_database(node: &KdlNode) -> DatabaseConfig {
    let mut db = DatabaseConfig::default();
    for child in children(node) {
        match child.name().value() {
            "driver" => {
                if let Some(d) = first_string(child) {
                    db.driver = d;
                }
            }
            "service" => db.service = first_string(child),
            "name" => {
                if let Some(n) = first_string(child) {
                    db.name = n;
                }
            }
            "user" => {
                if let Some(u) = first_string(child) {
                    db.user = u;
                }
            }
            "password-env" => db.password_env = first_string(child),
            "file" => db.file = first_string(child).map(PathBuf::from),
            "backup-dir" => {
                if let Some(d) = first_string(child) {
                    db.backup_dir = PathBuf::from(d);
                }
            }
            _ => {}
        }
    }
    db
}

fn parse_storage(node: &KdlNode) -> StorageConfig {
    let mut st = StorageConfig::default();
    for child in children(node) {
        match child.name().value() {
            "driver" => {
                if let Some(d) = first_string(child) {
                    st.driver = d;
                }
            }
            "service" => st.service = first_string(child),
            "alias" => {
                if let Some(a) = first_string(child) {
                    st.alias = a;
                }
            }
            "bucket" => {
                if let Some(b) = first_string(child) {
                    st.bucket = b;
                }
            }
            "root" => {
                if let Some(r) = first_string(child) {
                    st.root = r;
                }
            }
            _ => {}
        }
    }
    st
}

fn parse_hosts(node: &KdlNode) -> HostsConfig {
    let mut hosts = HostsConfig::default();
    for child in children(node) {
        match child.name().value() {
            "manage" => hosts.manage = first_bool(child).unwrap_or(true),
            "file" => {
                if let Some(f) = first_string(child) {
                    hosts.file = f;
                }
            }
            "sudo" | "use-sudo" => hosts.use_sudo = first_bool(child).unwrap_or(true),
            "entry" => {
                // entry "hostname" "ip"
                let mut values = Vec::new();
                extract_strings(child, &mut values);
                if values.len() >= 2 {
                    hosts.entries.insert(values[0].clone(), values[1].clone());
                }
            }
            _ => {}
        }
    }
    hosts
}

fn parse_groups(node: &KdlNode) -> GroupToggles {
    let mut groups = GroupToggles::default();
    for child in children(node) {
        let value = first_bool(child).unwrap_or(true);
        match child.name().value() {
            "stack" => groups.stack = value,
            "database" | "db" => groups.database = value,
            "storage" => groups.storage = value,
            "hosts" => groups.hosts = value,
            _ => {}
        }
    }
    groups
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

fn first_integer(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .find_map(|e| e.value().as_integer())
}

fn extract_strings(node: &KdlNode, target: &mut Vec<String>) {
    for entry in node.entries() {
        if entry.name().is_none()
            && let Some(val) = entry.value().as_string()
        {
            target.push(val.to_string());
        }
    }
    for child in children(node) {
        target.push(child.name().value().to_string());
    }
}

#[cfg(test)]
mod tests;
