//! Configuration loading: the single entry point over the layer stack.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{environment, global_file, workspace_file};
use super::ManagerConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Layers, lowest to highest precedence: defaults, global file, workspace files,
    /// `AZSNAP_*` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ManagerConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);
        let config: ManagerConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "configuration loaded");
        Ok(config)
    }

    /// Load one explicit file over the defaults. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<ManagerConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
