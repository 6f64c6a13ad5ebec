use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::{TestError, TestOutcome, TestRun};
use crate::presentation::{banner, escape, MessageKey};
use crate::request::TestRequest;
use crate::session::{CommandTag, SessionContext, StreamMessage};
use crate::subprocess::streaming::drain_merged;
use crate::subprocess::{ProcessError, ProcessHandle};
use crate::workspace::{PathResolver, Toolchain};

#[derive(Clone)]
pub struct TestOrchestrator {
    toolchain: Toolchain,
    resolver: Arc<dyn PathResolver>,
}

impl TestOrchestrator {
    pub fn new(toolchain: Toolchain, resolver: Arc<dyn PathResolver>) -> Self {
        Self {
            toolchain,
            resolver,
        }
    }

    pub async fn start(
        &self,
        ctx: SessionContext,
        request: &TestRequest,
    ) -> Result<TestRun, TestError> {
        let resolved =
            self.resolver
                .resolve(ctx.user_id(), &request.target_file_ref, request.path_type)?;
        self.start_in(ctx, &resolved.path).await
    }

    /// Start `go test -v` in the directory of `target`.
    ///
    /// Returns once the process is running; the output is collected and
    /// delivered by a background task.
    pub async fn start_in(&self, ctx: SessionContext, target: &Path) -> Result<TestRun, TestError> {
        let dir = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| TestError::NoParentDir(target.to_path_buf()))?;

        let command = self
            .toolchain
            .go_command(ctx.user_id(), dir)
            .args(["test", "-v"])
            .build();
        let handle = self.toolchain.runner().spawn(command).await?;

        if ctx.is_live() {
            let text = self.toolchain.message(ctx.user_id(), MessageKey::StartTest);
            ctx.send(StreamMessage::Start {
                tag: CommandTag::StartTest,
                output: banner(MessageKey::StartTest, &text),
            });
        }

        let run_id = Uuid::new_v4();
        let span = info_span!(
            "go_test",
            run_id = %run_id,
            session = %ctx.session_id(),
            user = %ctx.user_id()
        );
        info!(parent: &span, "Running go test in {}", dir.display());

        let toolchain = self.toolchain.clone();
        let task = tokio::spawn(collect_and_report(toolchain, ctx, handle).instrument(span));

        Ok(TestRun {
            run_id,
            handle: task,
        })
    }
}

async fn collect_and_report(
    toolchain: Toolchain,
    ctx: SessionContext,
    mut handle: ProcessHandle,
) -> Result<TestOutcome, ProcessError> {
    let stdout = handle.take_stdout()?;
    let stderr = handle.take_stderr()?;
    let output = drain_merged(stdout, stderr).await;
    let status = handle.wait().await?;

    let key = if status.success() {
        MessageKey::TestPassed
    } else {
        MessageKey::TestFailed
    };
    debug!("go test finished with {:?}", status);

    let text = toolchain.message(ctx.user_id(), key);
    let delivered = ctx.send(StreamMessage::Completion {
        tag: CommandTag::GoTest,
        output: format!("{}{}", banner(key, &text), escape(&output)),
        executable: None,
        next_command: None,
    });
    if !delivered && ctx.has_channel() {
        warn!("Test result for session {} could not be delivered", ctx.session_id());
    }

    Ok(TestOutcome {
        status,
        output,
        delivered,
    })
}
