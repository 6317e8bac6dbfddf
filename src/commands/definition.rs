//! Declarative command definitions.
//!
//! A [`CommandDefinition`] is a plain record describing one CLI command:
//! name, flags, positional arguments, nested subcommands, and the action
//! closure invoked with the parsed input and the shared [`Context`]. The
//! registrar turns a list of these into the live clap command tree.

use crate::context::Context;
use crate::error::{Result, StackctlError};
use std::collections::HashMap;
use std::sync::Arc;

/// Display category for help grouping. Known categories have a fixed
/// display priority; anything else lands after them, alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Stack,
    Database,
    Storage,
    Hosts,
    Plugin,
    Custom,
    Other(String),
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Self::Stack => "Stack",
            Self::Database => "Database",
            Self::Storage => "Storage",
            Self::Hosts => "Hosts",
            Self::Plugin => "Plugins",
            Self::Custom => "Custom",
            Self::Other(label) => label,
        }
    }

    /// Position in the fixed display order, `None` for unranked labels.
    pub fn priority(&self) -> Option<usize> {
        match self {
            Self::Stack => Some(0),
            Self::Database => Some(1),
            Self::Storage => Some(2),
            Self::Hosts => Some(3),
            Self::Plugin => Some(4),
            Self::Custom => Some(5),
            Self::Other(_) => None,
        }
    }

    pub fn parse(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "stack" => Self::Stack,
            "database" | "db" => Self::Database,
            "storage" => Self::Storage,
            "hosts" => Self::Hosts,
            "plugin" | "plugins" => Self::Plugin,
            "custom" => Self::Custom,
            _ => Self::Other(label.to_string()),
        }
    }
}

/// An option flag or valued option.
#[derive(Debug, Clone)]
pub struct OptSpec {
    pub name: String,
    pub short: Option<char>,
    pub help: String,
    pub takes_value: bool,
    pub value_name: Option<String>,
}

impl OptSpec {
    pub fn flag(name: &str, short: Option<char>, help: &str) -> Self {
        Self {
            name: name.to_string(),
            short,
            help: help.to_string(),
            takes_value: false,
            value_name: None,
        }
    }

    pub fn value(name: &str, short: Option<char>, value_name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            short,
            help: help.to_string(),
            takes_value: true,
            value_name: Some(value_name.to_string()),
        }
    }
}

/// A positional argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: String,
    pub help: String,
    pub required: bool,
    pub variadic: bool,
}

impl ArgSpec {
    pub fn required(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required: true,
            variadic: false,
        }
    }

    pub fn optional(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required: false,
            variadic: false,
        }
    }

    pub fn variadic(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            required: false,
            variadic: true,
        }
    }
}

pub type Action = Arc<dyn Fn(&Invocation, &Context) -> Result<()> + Send + Sync>;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub about: String,
    pub category: Category,
    pub aliases: Vec<String>,
    pub options: Vec<OptSpec>,
    pub args: Vec<ArgSpec>,
    /// Forward unrecognized flags to the action (wrapped-tool commands).
    pub allow_unknown: bool,
    pub subcommands: Vec<CommandDefinition>,
    pub action: Option<Action>,
}

impl CommandDefinition {
    pub fn new(name: &str, about: &str) -> Self {
        Self {
            name: name.to_string(),
            about: about.to_string(),
            category: Category::Other("Other".to_string()),
            aliases: Vec::new(),
            options: Vec::new(),
            args: Vec::new(),
            allow_unknown: false,
            subcommands: Vec::new(),
            action: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn option(mut self, option: OptSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    pub fn subcommand(mut self, subcommand: CommandDefinition) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation, &Context) -> Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// A definition is valid iff it has a name and either an action or at
    /// least one subcommand.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StackctlError::ConfigError(
                "command definition has no name".to_string(),
            ));
        }
        if self.action.is_none() && self.subcommands.is_empty() {
            return Err(StackctlError::ConfigError(format!(
                "command '{}' has neither an action nor subcommands",
                self.name
            )));
        }
        if self
            .args
            .iter()
            .rev()
            .skip(1)
            .any(|a| a.variadic)
        {
            return Err(StackctlError::ConfigError(format!(
                "command '{}': only the last argument may be variadic",
                self.name
            )));
        }
        for subcommand in &self.subcommands {
            subcommand.validate()?;
        }
        Ok(())
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }
}

impl std::fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("subcommands", &self.subcommands.len())
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Parsed input handed to an action.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    flags: HashMap<String, bool>,
    values: HashMap<String, String>,
    /// Positional arguments in declaration order; a trailing variadic
    /// argument contributes all remaining words.
    pub args: Vec<String>,
    /// Passthrough words for `allow_unknown` commands.
    pub rest: Vec<String>,
}

impl Invocation {
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        self.flags.insert(name.to_string(), value);
    }

    pub fn set_value(&mut self, name: &str, value: String) {
        self.values.insert(name.to_string(), value);
    }
}
