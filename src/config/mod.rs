pub mod loader;
pub mod types;

pub use loader::{discover, load_file, parse_config};
pub use types::{
    Config, DatabaseConfig, ExecutorConfig, GroupToggles, HostsConfig, StorageConfig,
};

/// Name of the project configuration file searched upward from the
/// working directory.
pub const CONFIG_FILE: &str = "stackctl.kdl";
