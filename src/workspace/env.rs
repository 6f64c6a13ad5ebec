use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::RelayConfig;

/// Environment variables layered over the relay's own environment for every
/// toolchain command run on a user's behalf.
pub trait EnvOverlayBuilder: Send + Sync {
    fn overlay(&self, user_id: &str) -> HashMap<String, String>;
}

/// Gives each user their own GOPATH and build cache.
#[derive(Debug, Clone)]
pub struct UserToolchainEnv {
    workspace_root: PathBuf,
    cache_root: PathBuf,
    goroot: Option<PathBuf>,
}

impl UserToolchainEnv {
    pub fn new(workspace_root: PathBuf, cache_root: PathBuf, goroot: Option<PathBuf>) -> Self {
        Self {
            workspace_root,
            cache_root,
            goroot,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.workspace.root.clone(),
            config.workspace.cache_root.clone(),
            config.toolchain.goroot.clone(),
        )
    }
}

impl EnvOverlayBuilder for UserToolchainEnv {
    fn overlay(&self, user_id: &str) -> HashMap<String, String> {
        let mut env = HashMap::new();
        let gopath = self.workspace_root.join(user_id);
        let cache = self.cache_root.join(user_id).join("go-build");

        env.insert("GOPATH".to_string(), gopath.to_string_lossy().into_owned());
        env.insert("GOCACHE".to_string(), cache.to_string_lossy().into_owned());
        env.insert("GO111MODULE".to_string(), "on".to_string());
        if let Some(goroot) = &self.goroot {
            env.insert("GOROOT".to_string(), goroot.to_string_lossy().into_owned());
        }
        env
    }
}
