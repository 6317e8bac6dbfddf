//! Error suggestions and helpful messages
//!
//! Provides actionable suggestions for common error scenarios

use crate::error::StackctlError;
use colored::Colorize;

/// Extension trait to add suggestions to errors
pub trait ErrorSuggestions {
    /// Get a helpful suggestion for this error
    fn suggestion(&self) -> Option<String>;

    /// Display the error with its suggestion
    fn display_with_suggestion(&self) -> String;
}

impl ErrorSuggestions for StackctlError {
    fn suggestion(&self) -> Option<String> {
        match self {
            StackctlError::ConfigNotFound { .. } => Some(format!(
                "Create a {} at your project root, or point at one with {}",
                "stackctl.kdl".cyan(),
                "--config <path>".cyan()
            )),
            StackctlError::ConfigError(msg) => {
                if msg.contains("compose") {
                    Some(format!(
                        "Set {} in stackctl.kdl, or place a compose.yaml / docker-compose.yml at the project root",
                        "executor \"compose\" { compose-file \"...\" }".cyan()
                    ))
                } else {
                    Some(format!(
                        "Check your KDL syntax at {}\nCommon issues: missing braces, invalid node names",
                        "https://kdl.dev".cyan()
                    ))
                }
            }
            StackctlError::ServiceNotMapped { service, .. } => Some(format!(
                "Add a mapping for it in stackctl.kdl:\n  executor \"compose\" {{ services {{ {} \"<container-name>\" }} }}",
                service.cyan()
            )),
            StackctlError::DriverNotRegistered { kind, .. } => Some(format!(
                "Set a registered {} driver in stackctl.kdl, or \"none\" to disable the {} commands",
                kind, kind
            )),
            StackctlError::SystemCommandFailed { command, reason: _ } => {
                if command.contains("docker") {
                    Some(format!(
                        "Check that Docker is running, and that the stack is up: {}",
                        "stackctl up".cyan()
                    ))
                } else if command.contains("ssh") || command.contains("scp") {
                    Some(format!(
                        "Check the remote settings in stackctl.kdl and that {} can reach the host",
                        "ssh".cyan()
                    ))
                } else {
                    Some(format!(
                        "Check that '{}' is installed and in your PATH",
                        command.split_whitespace().next().unwrap_or(command).cyan()
                    ))
                }
            }
            StackctlError::ResourceMissing(msg) => {
                if msg.contains("snapshot") {
                    Some(format!(
                        "Create one first: {}",
                        "stackctl db snapshot".cyan()
                    ))
                } else if msg.contains("backup") {
                    Some(format!("Create one first: {}", "stackctl db backup".cyan()))
                } else {
                    None
                }
            }
            StackctlError::PluginError(_) => Some(format!(
                "List enabled plugins and their state with {}",
                "stackctl info".cyan()
            )),
            _ => None,
        }
    }

    fn display_with_suggestion(&self) -> String {
        let base_msg = format!("{}", self);

        if let Some(suggestion) = self.suggestion() {
            format!("{}\n\n{}", base_msg.red().bold(), suggestion)
        } else {
            base_msg.red().bold().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_suggestion() {
        let error = StackctlError::ConfigNotFound {
            file: "stackctl.kdl".to_string(),
            start: std::path::PathBuf::from("/fake/path"),
        };

        let suggestion = error.suggestion();
        assert!(suggestion.is_some());
        assert!(suggestion.unwrap().contains("stackctl.kdl"));
    }

    #[test]
    fn test_unmapped_service_suggestion() {
        let error = StackctlError::ServiceNotMapped {
            service: "app".to_string(),
            known: vec!["db".to_string()],
        };

        let suggestion = error.suggestion().unwrap();
        assert!(suggestion.contains("services"));
        assert!(suggestion.contains("app"));
    }

    #[test]
    fn test_missing_snapshot_suggestion() {
        let error = StackctlError::ResourceMissing("No snapshots available".to_string());

        let suggestion = error.suggestion().unwrap();
        assert!(suggestion.contains("db snapshot"));
    }
}
