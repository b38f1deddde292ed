//! Configuration System
//!
//! Hierarchical shell configuration: built-in defaults, the global config file, workspace
//! config files and `PAGESHELL__*` environment variables, validated after loading.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub shell: ShellSection,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub dialog: DialogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shell presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellSection {
    /// Initial shell title
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "PageShell".to_string()
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

/// Order in which `clear_back_stack` disposes the entries below the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearOrder {
    /// Nearest to the current page first
    #[default]
    TopDown,
    /// Oldest entry first
    BottomUp,
}

/// Back-stack settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub clear_order: ClearOrder,
}

/// Dialog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Maximum owner-chain depth of an open dialog
    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,
}

fn default_max_nesting() -> usize {
    16
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            max_nesting: default_max_nesting(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Shell(String),
    Dialog(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Shell(msg) => write!(f, "Shell: {}", msg),
            ValidationError::Dialog(msg) => write!(f, "Dialog: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ShellConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.shell.title.trim().is_empty() {
            errors.push(ValidationError::Shell("Title cannot be empty".to_string()));
        }

        if self.dialog.max_nesting == 0 {
            errors.push(ValidationError::Dialog(
                "max_nesting must be at least 1".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
