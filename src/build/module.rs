//! Module metadata preparation before a compile

use std::path::Path;
use tracing::{debug, warn};

use super::BuildError;
use crate::workspace::Toolchain;

/// Output of `go mod init` when another request created `go.mod` first.
pub const ALREADY_EXISTS: &str = "go.mod already exists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleAction {
    /// `go mod init <name>`
    Init(String),
    /// `go mod tidy`
    Tidy,
}

impl ModuleAction {
    pub async fn for_dir(dir: &Path) -> Self {
        if tokio::fs::try_exists(dir.join("go.mod")).await.unwrap_or(false) {
            ModuleAction::Tidy
        } else {
            let name = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "main".to_string());
            ModuleAction::Init(name)
        }
    }

    pub fn args(&self) -> Vec<&str> {
        match self {
            ModuleAction::Init(name) => vec!["mod", "init", name],
            ModuleAction::Tidy => vec!["mod", "tidy"],
        }
    }
}

/// Make sure `dir` is a Go module with tidy requirements.
///
/// A failure whose output says the module already exists is tolerated, so
/// concurrent builds in one directory do not abort each other.
pub async fn prepare_module(
    toolchain: &Toolchain,
    user_id: &str,
    dir: &Path,
) -> Result<ModuleAction, BuildError> {
    let action = ModuleAction::for_dir(dir).await;
    let command = toolchain
        .go_command(user_id, dir)
        .args(action.args())
        .build();

    debug!("Preparing module: {}", command.command_line());
    let output = toolchain.runner().run(command).await?;

    if output.status.success() {
        return Ok(action);
    }

    let combined = output.combined();
    if combined.contains(ALREADY_EXISTS) {
        warn!(
            "Module in {} was created concurrently; continuing",
            dir.display()
        );
        return Ok(action);
    }

    Err(BuildError::ModuleInit {
        dir: dir.to_path_buf(),
        output: combined.trim_end().to_string(),
    })
}
