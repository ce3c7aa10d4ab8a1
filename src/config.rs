use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{
    DEFAULT_BLOCKS_PER_GROUP, DEFAULT_BLOCK_SIZE, DEFAULT_GROUPS_PER_LINE, DEFAULT_SHARES,
    DEFAULT_THRESHOLD, ENV_PREFIX,
};
use crate::share::CleanLayout;

/// Settings for the command-line tool.
///
/// Sources are layered: built-in defaults, then the optional TOML file, then
/// `SHAMIR_*` environment variables (nested keys use `__`, e.g.
/// `SHAMIR_CLEAN__BLOCK_SIZE=8`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShamirConfig {
    /// Threshold used by `split` when none is given on the command line.
    pub threshold: usize,

    /// Share count used by `split` when none is given on the command line.
    pub shares: usize,

    /// Layout of clean-printed shares.
    pub clean: CleanLayout,
}

impl Default for ShamirConfig {
    fn default() -> Self {
        ShamirConfig {
            threshold: DEFAULT_THRESHOLD,
            shares: DEFAULT_SHARES,
            clean: CleanLayout::default(),
        }
    }
}

impl ShamirConfig {
    /// Loads the settings. A missing file is not an error.
    pub fn new(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("threshold", DEFAULT_THRESHOLD as i64)?
            .set_default("shares", DEFAULT_SHARES as i64)?
            .set_default("clean.block_size", DEFAULT_BLOCK_SIZE as i64)?
            .set_default("clean.blocks_per_group", DEFAULT_BLOCKS_PER_GROUP as i64)?
            .set_default("clean.groups_per_line", DEFAULT_GROUPS_PER_LINE as i64)?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let my_config: ShamirConfig = settings.try_into()?;
        debug!("📝 Loaded config from {:?}: {:?}", path, my_config);
        Ok(my_config)
    }

    /// Writes the default settings to `path` unless a file already exists there.
    ///
    /// Returns the path written, or `None` if the file was left alone.
    pub fn write_default(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
        if path.exists() {
            return Ok(None);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| ConfigError::Foreign(Box::new(err)))?;
        }
        fs::write(path, ShamirConfig::default().to_toml()?)
            .map_err(|err| ConfigError::Foreign(Box::new(err)))?;
        Ok(Some(path.to_path_buf()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Foreign(Box::new(err)))
    }
}

impl TryFrom<Config> for ShamirConfig {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        Ok(ShamirConfig {
            threshold: config.get("threshold")?,
            shares: config.get("shares")?,
            clean: CleanLayout {
                block_size: config.get("clean.block_size")?,
                blocks_per_group: config.get("clean.blocks_per_group")?,
                groups_per_line: config.get("clean.groups_per_line")?,
            },
        })
    }
}
