use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{get_global_relay_dir, ConfigError, RelayConfig};

pub struct ConfigLoader {
    config: RelayConfig,
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config: RelayConfig::new(),
            sources: Vec::new(),
        }
    }

    /// Load `config.toml` from the data directory if it exists.
    pub async fn load_global(&mut self) -> Result<(), ConfigError> {
        let Ok(dir) = get_global_relay_dir() else {
            debug!("No home directory; using built-in configuration");
            return Ok(());
        };

        let path = dir.join("config.toml");
        if fs::try_exists(&path).await.unwrap_or(false) {
            self.load_file(&path).await?;
        }

        Ok(())
    }

    /// Load an explicitly named file. A missing file is an error.
    pub async fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        self.config = parse_config(&content, path)?;
        self.sources.push(path.to_path_buf());
        info!("Loaded configuration from {}", path.display());

        Ok(())
    }

    pub fn merge_env_vars(&mut self) {
        self.config.merge_env_vars();
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn get_config(&self) -> RelayConfig {
        self.config.clone()
    }

    pub fn into_config(self) -> Result<RelayConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_config(content: &str, path: &Path) -> Result<RelayConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Defaults, then the file, then the environment, then validation.
pub async fn load_config(explicit: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut loader = ConfigLoader::new();
    match explicit {
        Some(path) => loader.load_file(path).await?,
        None => loader.load_global().await?,
    }
    loader.merge_env_vars();
    loader.into_config()
}
