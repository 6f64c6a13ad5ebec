//! `go test` runs relayed as a single completion frame
//!
//! Unlike a build, test output is not streamed line by line. The whole run is
//! buffered in a background task and delivered at once, prefixed with a pass
//! or fail banner.

pub mod orchestrator;


pub use orchestrator::TestOrchestrator;

use std::path::PathBuf;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{ErrorCode, RelayError};
use crate::subprocess::{ExitStatus, ProcessError};
use crate::workspace::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{} has no parent directory", .0.display())]
    NoParentDir(PathBuf),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<TestError> for RelayError {
    fn from(err: TestError) -> Self {
        match err {
            TestError::Resolve(e) => e.into(),
            TestError::Process(e) => e.into(),
            TestError::NoParentDir(_) => {
                RelayError::build(ErrorCode::BUILD_UNRESOLVED_PATH, err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub status: ExitStatus,
    /// Standard output followed by standard error
    pub output: String,
    pub delivered: bool,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.status.success()
    }
}

/// A test run that has been started in the background.
#[derive(Debug)]
pub struct TestRun {
    pub run_id: Uuid,
    pub handle: JoinHandle<Result<TestOutcome, ProcessError>>,
}
