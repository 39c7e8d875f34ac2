//! CLI configuration

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration, read from `config.toml`
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Verification service endpoint
    pub endpoint: Option<String>,

    /// Bearer token for the verification service
    pub api_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Organization used when none is given on the command line
    pub default_organization: Option<String>,

    /// Where the session snapshot is kept between invocations
    pub session_file: Option<PathBuf>,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("default_organization", &self.default_organization)
            .field("session_file", &self.session_file)
            .finish()
    }
}

impl CliConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if !config_path.exists() {
            return Ok(CliConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", config_path.display()))
    }

    /// Session snapshot location, defaulting to the user's data directory
    pub fn session_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .or_else(dirs::config_dir)
            .ok_or_else(|| anyhow!("Cannot find a data directory for the session file"))?;
        Ok(data_dir.join("bgv").join("session.json"))
    }

    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("Cannot find config directory"))?;
        Ok(config_dir.join("bgv").join("config.toml"))
    }
}
