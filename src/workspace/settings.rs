use std::collections::HashMap;

use crate::config::{RelayConfig, UserSettings};

/// GOOS name of the platform the relay runs on.
pub fn current_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Per-user extra `go build` arguments.
pub trait BuildSettings: Send + Sync {
    fn build_args(&self, user_id: &str, goos: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct UserBuildArgs {
    users: HashMap<String, UserSettings>,
}

impl UserBuildArgs {
    pub fn new(users: HashMap<String, UserSettings>) -> Self {
        Self { users }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.users.clone())
    }
}

impl BuildSettings for UserBuildArgs {
    fn build_args(&self, user_id: &str, goos: &str) -> Vec<String> {
        self.users
            .get(user_id)
            .and_then(|user| user.build_args.get(goos))
            .cloned()
            .unwrap_or_default()
    }
}
