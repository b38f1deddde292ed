//! Loader facade over the layered sources.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::ShellConfig;
use crate::error::ShellError;
use config::{Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`ShellConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root`.
    ///
    /// Sources, lowest to highest: defaults, global file, `config/config.toml`,
    /// `config/{PAGESHELL_ENV}.toml`, `PAGESHELL__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ShellConfig, ShellError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder
            .add_source(
                Environment::with_prefix("PAGESHELL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: ShellConfig = config.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load a single file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<ShellConfig, ShellError> {
        let config = builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
