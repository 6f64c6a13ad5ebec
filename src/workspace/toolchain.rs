use std::path::Path;
use std::sync::Arc;

use super::env::{EnvOverlayBuilder, UserToolchainEnv};
use super::settings::{BuildSettings, UserBuildArgs};
use crate::config::RelayConfig;
use crate::presentation::{MessageCatalog, MessageKey};
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Everything needed to run the Go toolchain for a user.
#[derive(Clone)]
pub struct Toolchain {
    go_binary: String,
    required_build_flag: Option<String>,
    runner: Arc<dyn ProcessRunner>,
    env: Arc<dyn EnvOverlayBuilder>,
    settings: Arc<dyn BuildSettings>,
    messages: Arc<dyn MessageCatalog>,
}

impl Toolchain {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        env: Arc<dyn EnvOverlayBuilder>,
        settings: Arc<dyn BuildSettings>,
        messages: Arc<dyn MessageCatalog>,
    ) -> Self {
        Self {
            go_binary: "go".to_string(),
            required_build_flag: Some("-i".to_string()),
            runner,
            env,
            settings,
            messages,
        }
    }

    pub fn from_config(config: &RelayConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self::new(
            runner,
            Arc::new(UserToolchainEnv::from_config(config)),
            Arc::new(UserBuildArgs::from_config(config)),
            Arc::new(config.banners.clone()),
        )
        .with_go_binary(config.toolchain.go_binary.clone())
        .with_required_build_flag(config.toolchain.required_build_flag.clone())
    }

    pub fn with_go_binary(mut self, go_binary: impl Into<String>) -> Self {
        self.go_binary = go_binary.into();
        self
    }

    pub fn with_required_build_flag(mut self, flag: Option<String>) -> Self {
        self.required_build_flag = flag;
        self
    }

    pub fn go_binary(&self) -> &str {
        &self.go_binary
    }

    pub fn required_build_flag(&self) -> Option<&str> {
        self.required_build_flag.as_deref()
    }

    pub fn runner(&self) -> &Arc<dyn ProcessRunner> {
        &self.runner
    }

    pub fn settings(&self) -> &dyn BuildSettings {
        self.settings.as_ref()
    }

    pub fn message(&self, user_id: &str, key: MessageKey) -> String {
        self.messages.text(user_id, key)
    }

    /// A `go` invocation in `dir` carrying the user's environment overlay.
    pub fn go_command(&self, user_id: &str, dir: &Path) -> ProcessCommandBuilder {
        ProcessCommandBuilder::new(&self.go_binary)
            .envs(self.env.overlay(user_id))
            .current_dir(dir)
    }
}
