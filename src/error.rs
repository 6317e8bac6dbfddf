use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackctlError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No project configuration found (searched for '{file}' upward from {})", start.display())]
    ConfigNotFound { file: String, start: PathBuf },

    #[error("IO error at '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error("KDL parse error: {0}")]
    KdlError(#[from] kdl::KdlError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yml::Error),

    /// A service key with no mapping in the configured service table.
    #[error("Service '{service}' is not mapped in the configuration (known services: {})", known.join(", "))]
    ServiceNotMapped { service: String, known: Vec<String> },

    /// A driver name with no registered provider class for its kind.
    #[error("No {kind} driver named '{driver}' is registered (registered drivers: {})", known.join(", "))]
    DriverNotRegistered {
        kind: &'static str,
        driver: String,
        known: Vec<String>,
    },

    #[error("System command '{command}' failed: {reason}")]
    SystemCommandFailed { command: String, reason: String },

    /// A backup, snapshot or object the operation needs does not exist.
    #[error("{0}")]
    ResourceMissing(String),

    #[error("Plugin error: {0}")]
    PluginError(String),

    /// Path resolution or validation error
    #[error("Path error: {0}")]
    PathError(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, StackctlError>;
