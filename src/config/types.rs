use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The validated project configuration.
///
/// Immutable for the process lifetime once loaded; held by the `Context`
/// and read by the command loader and every backend/provider factory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project name, used for default container prefixes and messages.
    pub project: String,
    /// Directory containing the config file. All relative paths in the
    /// configuration resolve against this.
    pub root: PathBuf,
    pub executor: ExecutorConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub hosts: HostsConfig,
    /// Plugins to enable, in declaration order.
    pub plugins: Vec<String>,
    pub groups: GroupToggles,
    /// User-declared custom command paths (files or directories),
    /// relative to the project root unless absolute.
    pub custom_commands: Vec<PathBuf>,
}

impl Config {
    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: "project".to_string(),
            root: PathBuf::from("."),
            executor: ExecutorConfig::default(),
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
            hosts: HostsConfig::default(),
            plugins: Vec::new(),
            groups: GroupToggles::default(),
            custom_commands: Vec::new(),
        }
    }
}

/// Execution backend selection plus its per-mode settings.
#[derive(Debug, Clone)]
pub enum ExecutorConfig {
    Compose {
        /// Explicit compose file path. When unset, conventional file
        /// names are probed at the project root.
        compose_file: Option<PathBuf>,
        /// Service key -> compose service name.
        services: BTreeMap<String, String>,
        /// Service keys restarted by `reload`. Empty means all mapped.
        reloadable: Vec<String>,
    },
    Local {
        shell: String,
        working_dir: Option<PathBuf>,
    },
    Remote {
        host: String,
        user: Option<String>,
        port: Option<u16>,
        identity: Option<PathBuf>,
        working_dir: Option<String>,
    },
}

impl ExecutorConfig {
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Compose { .. } => "compose",
            Self::Local { .. } => "local",
            Self::Remote { .. } => "remote",
        }
    }

    pub fn is_compose(&self) -> bool {
        matches!(self, Self::Compose { .. })
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::Local {
            shell: default_shell(),
            working_dir: None,
        }
    }
}

pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

/// Database driver selection and connection settings.
///
/// The password is never stored in the configuration; `password_env`
/// names an environment variable read at call time.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// "postgres", "mysql", "sqlite" or "none".
    pub driver: String,
    /// Service key hosting the database (compose mode). Unset means the
    /// database tools run directly through the executor.
    pub service: Option<String>,
    pub name: String,
    pub user: String,
    pub password_env: Option<String>,
    /// SQLite only: database file path.
    pub file: Option<PathBuf>,
    /// Backup/snapshot directory, absolute or relative to project root.
    pub backup_dir: PathBuf,
}

impl DatabaseConfig {
    pub fn enabled(&self) -> bool {
        !self.driver.is_empty() && self.driver != "none"
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "none".to_string(),
            service: None,
            name: String::new(),
            user: String::new(),
            password_env: None,
            file: None,
            backup_dir: PathBuf::from(".stackctl/backups"),
        }
    }
}

/// Object storage driver selection.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// "local", "bucket" or "none".
    pub driver: String,
    /// Service key for the local driver when files live in a container.
    pub service: Option<String>,
    /// `mc` alias for the bucket driver.
    pub alias: String,
    pub bucket: String,
    /// Root directory for the local driver.
    pub root: String,
}

impl StorageConfig {
    pub fn enabled(&self) -> bool {
        !self.driver.is_empty() && self.driver != "none"
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: "none".to_string(),
            service: None,
            alias: "local".to_string(),
            bucket: String::new(),
            root: "storage".to_string(),
        }
    }
}

/// Hosts-file management settings.
#[derive(Debug, Clone)]
pub struct HostsConfig {
    pub manage: bool,
    pub file: String,
    pub use_sudo: bool,
    /// Entries declared in the configuration: hostname -> IP.
    pub entries: BTreeMap<String, String>,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            manage: false,
            file: "/etc/hosts".to_string(),
            use_sudo: true,
            entries: BTreeMap::new(),
        }
    }
}

/// Command-group toggles. Groups also gate on their resource being
/// configured; a toggle only ever narrows the surface.
#[derive(Debug, Clone, Serialize)]
pub struct GroupToggles {
    pub stack: bool,
    pub database: bool,
    pub storage: bool,
    pub hosts: bool,
}

impl Default for GroupToggles {
    fn default() -> Self {
        Self {
            stack: true,
            database: true,
            storage: true,
            hosts: true,
        }
    }
}
