use crate::error::{ErrorCode, RelayError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Working directory is not usable: {}", .0.display())]
    InvalidWorkingDir(PathBuf),

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for '{command}': {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture {0} of child process")]
    PipeUnavailable(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mock expectation not met: {0}")]
    MockExpectationNotMet(String),
}

impl ProcessError {
    /// Whether the toolchain could not be started at all.
    pub fn is_spawn_error(&self) -> bool {
        matches!(
            self,
            ProcessError::CommandNotFound(_)
                | ProcessError::InvalidWorkingDir(_)
                | ProcessError::SpawnFailed { .. }
        )
    }
}

impl From<ProcessError> for RelayError {
    fn from(err: ProcessError) -> Self {
        let code = match &err {
            ProcessError::CommandNotFound(_) => ErrorCode::EXEC_COMMAND_NOT_FOUND,
            ProcessError::InvalidWorkingDir(_) => ErrorCode::EXEC_INVALID_WORKDIR,
            ProcessError::SpawnFailed { .. } => ErrorCode::EXEC_SPAWN_FAILED,
            ProcessError::WaitFailed { .. } => ErrorCode::EXEC_WAIT_FAILED,
            ProcessError::PipeUnavailable(_) | ProcessError::Io(_) => ErrorCode::EXEC_OUTPUT_ERROR,
            ProcessError::MockExpectationNotMet(_) => ErrorCode::EXEC_GENERIC,
        };
        RelayError::execution(code, err.to_string()).with_source(err)
    }
}
