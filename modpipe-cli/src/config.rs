use std::fs;
use std::path::{Path, PathBuf};

use pipeline_modules::ResolverConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default catalog when `--catalog` is not given.
    pub catalog: Option<PathBuf>,
    pub include_standard: bool,
    pub output: OutputFormat,
    pub resolver: ResolverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            include_standard: true,
            output: OutputFormat::Pretty,
            resolver: ResolverConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the user config directory. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| AppError::Read {
            kind: "config",
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// `<config_dir>/modpipe/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modpipe").join("config.toml"))
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
