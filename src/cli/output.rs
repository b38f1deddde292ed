//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::ShellError;

/// Map shell errors to a string for CLI output.
pub fn map_error(e: &ShellError) -> String {
    match e {
        ShellError::ConfigError(message) => format!("Invalid configuration: {message}"),
        ShellError::Script(message) => format!("Script failed: {message}"),
        other => other.to_string(),
    }
}
