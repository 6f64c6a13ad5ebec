//! One-shot builds of scratch files in the shared playground directory

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::RelayError;
use crate::presentation::escape;
use crate::request::{validate_playground_name, ValidationError};
use crate::subprocess::ProcessError;
use crate::workspace::Toolchain;

#[derive(Debug, thiserror::Error)]
pub enum PlaygroundError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<PlaygroundError> for RelayError {
    fn from(err: PlaygroundError) -> Self {
        match err {
            PlaygroundError::Invalid(e) => e.into(),
            PlaygroundError::Process(e) => e.into(),
        }
    }
}

/// Result of a playground build. The output is returned whether or not the
/// build succeeded; the executable only when it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaygroundBuild {
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

impl PlaygroundBuild {
    pub fn succeeded(&self) -> bool {
        self.executable.is_some()
    }
}

#[derive(Clone)]
pub struct PlaygroundBuilder {
    toolchain: Toolchain,
    dir: PathBuf,
}

impl PlaygroundBuilder {
    pub fn new(toolchain: Toolchain, dir: PathBuf) -> Self {
        Self { toolchain, dir }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// `go build -o <dir>/<name> <dir>/<name>.go`
    pub async fn build(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<PlaygroundBuild, PlaygroundError> {
        validate_playground_name(file_name)?;

        let source = self.dir.join(file_name);
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let suffix = if cfg!(windows) { ".exe" } else { "" };
        let executable = self.dir.join(format!("{stem}{suffix}"));

        let command = self
            .toolchain
            .go_command(user_id, &self.dir)
            .arg("build")
            .arg("-o")
            .path_arg(&executable)
            .path_arg(&source)
            .build();

        info!("User [{}] playground build of {}", user_id, file_name);
        let output = self.toolchain.runner().run(command).await?;
        debug!(
            "Playground build of {} exited with {:?} in {:?}",
            file_name, output.status, output.duration
        );

        Ok(PlaygroundBuild {
            output: escape(&output.combined()),
            executable: output
                .status
                .success()
                .then(|| executable.to_string_lossy().into_owned()),
        })
    }
}
