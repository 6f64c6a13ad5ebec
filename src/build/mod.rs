//! Build a user's package and relay the compiler's output
//!
//! A build walks through a fixed sequence of phases:
//!
//! ```text
//! Idle -> Writing -> Preparing -> Compiling -> Succeeded | Failed -> Idle
//! ```
//!
//! Writing, Preparing and spawning the compiler can abort the sequence with a
//! [`BuildError`]. A compile that exits non-zero is not an error: it ends in
//! `Failed` with the parsed diagnostics sent to the session.

pub mod args;
pub mod module;
pub mod orchestrator;

#[cfg(test)]
mod tests;

pub use args::{build_args, executable_path};
pub use module::{prepare_module, ModuleAction, ALREADY_EXISTS};
pub use orchestrator::BuildOrchestrator;

use std::fmt;
use std::path::PathBuf;

use crate::diagnostics::Diagnostic;
use crate::error::{ErrorCode, RelayError};
use crate::subprocess::{ExitStatus, ProcessError};
use crate::workspace::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Writing,
    Preparing,
    Compiling,
    Succeeded,
    Failed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Idle => "idle",
            BuildPhase::Writing => "writing",
            BuildPhase::Preparing => "preparing",
            BuildPhase::Compiling => "compiling",
            BuildPhase::Succeeded => "succeeded",
            BuildPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{} is toolchain source and cannot be built", .0.display())]
    ReadOnlyTarget(PathBuf),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{} has no parent directory", .0.display())]
    NoParentDir(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Module preparation failed in {}: {output}", .dir.display())]
    ModuleInit { dir: PathBuf, output: String },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<BuildError> for RelayError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Process(e) => e.into(),
            BuildError::Resolve(e) => e.into(),
            BuildError::Write { path, source } => {
                let code = if source.kind() == std::io::ErrorKind::PermissionDenied {
                    ErrorCode::STORAGE_PERMISSION_DENIED
                } else {
                    ErrorCode::STORAGE_IO_ERROR
                };
                let message = format!("Failed to write {}: {}", path.display(), source);
                RelayError::storage(code, message, Some(path)).with_source(source)
            }
            other => {
                let code = match other {
                    BuildError::ReadOnlyTarget(_) => ErrorCode::BUILD_READ_ONLY_TARGET,
                    BuildError::NoParentDir(_) => ErrorCode::BUILD_UNRESOLVED_PATH,
                    _ => ErrorCode::BUILD_MODULE_INIT_FAILED,
                };
                RelayError::build(code, other.to_string()).with_source(other)
            }
        }
    }
}

/// What a finished compile produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub phase: BuildPhase,
    pub status: ExitStatus,
    pub executable: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any frame could not be delivered because the client went away
    pub channel_lost: bool,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.phase == BuildPhase::Succeeded
    }
}
