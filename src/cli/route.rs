//! CLI route: single route table and run context.

use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, ShellConfig};
use crate::error::ShellError;
use crate::host::{format_transcript_json, format_transcript_text, run_script};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Runtime context for CLI execution: workspace and effective configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: ShellConfig,
}

impl RunContext {
    /// Load configuration from `config_path` or the layered workspace sources.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ShellError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ShellError> {
        let started = Instant::now();
        let output = match command {
            Commands::Run {
                script,
                format,
                no_color,
            } => self.handle_run(script, format, !no_color),
            Commands::CheckConfig { format } => self.handle_check_config(format),
        };
        info!(
            command = command.name(),
            ok = output.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        output
    }

    fn handle_run(&self, script: &Path, format: &str, color: bool) -> Result<String, ShellError> {
        let path = if script.is_relative() {
            self.workspace_root.join(script)
        } else {
            script.to_path_buf()
        };
        let source = std::fs::read_to_string(&path).map_err(|e| {
            ShellError::Script(format!("cannot read {}: {}", path.display(), e))
        })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ShellError::Script(format!("cannot start runtime: {e}")))?;
        let transcript = runtime.block_on(run_script(&source, self.config.clone()))?;
        match format {
            "json" => format_transcript_json(&transcript),
            "text" => Ok(format_transcript_text(&transcript, color)),
            other => Err(ShellError::Script(format!("unknown output format: {other}"))),
        }
    }

    fn handle_check_config(&self, format: &str) -> Result<String, ShellError> {
        if let Err(errors) = self.config.validate() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(ShellError::ConfigError(messages.join("; ")));
        }
        let body = match format {
            "json" => serde_json::to_string_pretty(&self.config)
                .map_err(|e| ShellError::ConfigError(e.to_string()))?,
            "toml" => toml::to_string_pretty(&self.config)
                .map_err(|e| ShellError::ConfigError(e.to_string()))?,
            other => return Err(ShellError::ConfigError(format!("unknown output format: {other}"))),
        };
        let source = match &self.config_path {
            Some(path) => path.display().to_string(),
            None => format!("layered ({})", self.workspace_root.display()),
        };
        Ok(format!("# source: {source}\n{body}"))
    }
}
