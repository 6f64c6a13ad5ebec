//! Relay configuration
//!
//! Configuration is layered: built-in defaults, then a TOML file (either the
//! one passed with `--config` or `config.toml` in the relay's data directory),
//! then `BUILDRELAY_*` environment variables.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub mod loader;


pub use loader::{load_config, ConfigLoader};

use crate::error::{ErrorCode, RelayError};
use crate::presentation::Banners;

pub const ENV_PREFIX: &str = "BUILDRELAY_";

/// Data directory used when the config does not name one explicitly
pub fn get_global_relay_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("org", "buildrelay", "buildrelay")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDirectory)
}

fn global_dir_or_local() -> PathBuf {
    get_global_relay_dir().unwrap_or_else(|_| PathBuf::from(".buildrelay"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

impl From<ConfigError> for RelayError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::NotFound(_) => ErrorCode::CONFIG_NOT_FOUND,
            ConfigError::Read { .. } | ConfigError::NoHomeDirectory => ErrorCode::CONFIG_PATH_ERROR,
            ConfigError::Parse { .. } => ErrorCode::CONFIG_PARSE_ERROR,
            ConfigError::Invalid { .. } => ErrorCode::CONFIG_INVALID_VALUE,
        };
        RelayError::config_with_code(code, err.to_string()).with_source(err)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerSettings,
    pub toolchain: ToolchainSettings,
    pub workspace: WorkspaceSettings,
    pub banners: Banners,
    /// Per-user settings keyed by user id
    pub users: HashMap<String, UserSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    pub go_binary: String,
    /// Exported as `GOROOT` when set; also locates the Go API sources.
    pub goroot: Option<PathBuf>,
    /// Flag appended to every `go build` unless the user's arguments already carry it.
    pub required_build_flag: Option<String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            go_binary: "go".to_string(),
            goroot: None,
            required_build_flag: Some("-i".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Each user's GOPATH is `<root>/<user id>`; sources live under its `src`.
    pub root: PathBuf,
    /// Per-user `GOCACHE` directories are created under here.
    pub cache_root: PathBuf,
    pub playground_dir: PathBuf,
    /// Root of the toolchain's own sources (path type 1). Defaults to `<goroot>/src`.
    pub go_api_root: Option<PathBuf>,
    /// Shared GOPATH sources (path type 2).
    pub gopath_root: Option<PathBuf>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        let base = global_dir_or_local();
        Self {
            root: base.join("workspaces"),
            cache_root: base.join("cache"),
            playground_dir: base.join("playground"),
            go_api_root: None,
            gopath_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Extra `go build` arguments keyed by GOOS (`linux`, `darwin`, `windows`, ...)
    pub build_args: HashMap<String, Vec<String>>,
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `BUILDRELAY_*` overrides read through `lookup`.
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(bind) = var("BIND") {
            self.server.bind = bind;
        }

        if let Some(port) = var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring {ENV_PREFIX}PORT={port}: not a port number"),
            }
        }

        if let Some(go) = var("GO_BINARY") {
            self.toolchain.go_binary = go;
        }

        if let Some(goroot) = var("GOROOT") {
            self.toolchain.goroot = Some(PathBuf::from(goroot));
        }

        if let Some(flag) = var("REQUIRED_BUILD_FLAG") {
            self.toolchain.required_build_flag = (!flag.is_empty()).then_some(flag);
        }

        if let Some(root) = var("WORKSPACE_ROOT") {
            self.workspace.root = PathBuf::from(root);
        }

        if let Some(cache) = var("CACHE_ROOT") {
            self.workspace.cache_root = PathBuf::from(cache);
        }

        if let Some(dir) = var("PLAYGROUND_DIR") {
            self.workspace.playground_dir = PathBuf::from(dir);
        }

        if let Some(dir) = var("GO_API_ROOT") {
            self.workspace.go_api_root = Some(PathBuf::from(dir));
        }

        if let Some(dir) = var("GOPATH_ROOT") {
            self.workspace.gopath_root = Some(PathBuf::from(dir));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port".to_string(),
                message: "must be between 1 and 65535".to_string(),
            });
        }

        if self.toolchain.go_binary.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "toolchain.go_binary".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if let Some(flag) = &self.toolchain.required_build_flag {
            if !flag.starts_with('-') {
                return Err(ConfigError::Invalid {
                    field: "toolchain.required_build_flag".to_string(),
                    message: format!("'{flag}' is not a flag"),
                });
            }
        }

        Ok(())
    }

    /// Root of the Go API sources, if it can be determined.
    pub fn go_api_root(&self) -> Option<PathBuf> {
        self.workspace
            .go_api_root
            .clone()
            .or_else(|| self.toolchain.goroot.as_ref().map(|root| root.join("src")))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
