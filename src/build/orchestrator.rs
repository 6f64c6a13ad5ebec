use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::args::{build_args, executable_path};
use super::module::prepare_module;
use super::{BuildError, BuildOutcome, BuildPhase};
use crate::diagnostics::parse_diagnostics;
use crate::presentation::{banner, start_build_text, stderr_line, stdout_line, MessageKey};
use crate::request::BuildRequest;
use crate::session::{CommandTag, SessionContext, StreamMessage};
use crate::subprocess::streaming::{forward_lines, line_stream, ForwardSummary, StreamSource};
use crate::workspace::{current_goos, PathResolver, Toolchain};

/// Runs the write, prepare, compile sequence for one build request.
#[derive(Clone)]
pub struct BuildOrchestrator {
    toolchain: Toolchain,
    resolver: Arc<dyn PathResolver>,
}

fn advance(phase: &mut BuildPhase, next: BuildPhase, ctx: &SessionContext) {
    debug!(
        "Build for session {} (user {}): {} -> {}",
        ctx.session_id(),
        ctx.user_id(),
        phase,
        next
    );
    *phase = next;
}

impl BuildOrchestrator {
    pub fn new(toolchain: Toolchain, resolver: Arc<dyn PathResolver>) -> Self {
        Self {
            toolchain,
            resolver,
        }
    }

    /// Resolve the request's target and build it.
    pub async fn build(
        &self,
        ctx: &SessionContext,
        request: &BuildRequest,
    ) -> Result<BuildOutcome, BuildError> {
        let resolved =
            self.resolver
                .resolve(ctx.user_id(), &request.target_file_ref, request.path_type)?;

        if !resolved.class.is_writable() {
            warn!(
                "User [{}] tried to build toolchain source {}",
                ctx.user_id(),
                resolved.path.display()
            );
            return Err(BuildError::ReadOnlyTarget(resolved.path));
        }

        self.build_file(
            ctx,
            &resolved.path,
            &request.source_text,
            request.next_command.clone(),
        )
        .await
    }

    /// Overwrite `target` with `source_text` and build its package.
    pub async fn build_file(
        &self,
        ctx: &SessionContext,
        target: &Path,
        source_text: &str,
        next_command: Option<String>,
    ) -> Result<BuildOutcome, BuildError> {
        let user_id = ctx.user_id();
        let dir = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| BuildError::NoParentDir(target.to_path_buf()))?;
        let mut phase = BuildPhase::Idle;

        advance(&mut phase, BuildPhase::Writing, ctx);
        tokio::fs::write(target, source_text)
            .await
            .map_err(|source| BuildError::Write {
                path: target.to_path_buf(),
                source,
            })?;

        let platform_args = self.toolchain.settings().build_args(user_id, current_goos());
        if ctx.is_live() {
            let text = start_build_text(
                &self.toolchain.message(user_id, MessageKey::StartBuild),
                &platform_args,
            );
            ctx.send(StreamMessage::Start {
                tag: CommandTag::StartBuild,
                output: banner(MessageKey::StartBuild, &text),
            });
        }

        advance(&mut phase, BuildPhase::Preparing, ctx);
        let action = prepare_module(&self.toolchain, user_id, &dir).await?;
        debug!("Module ready in {} ({:?})", dir.display(), action);

        advance(&mut phase, BuildPhase::Compiling, ctx);
        let outcome = self.compile(ctx, &dir, &platform_args, next_command).await?;

        advance(&mut phase, outcome.phase, ctx);
        advance(&mut phase, BuildPhase::Idle, ctx);
        Ok(outcome)
    }

    async fn compile(
        &self,
        ctx: &SessionContext,
        dir: &Path,
        platform_args: &[String],
        next_command: Option<String>,
    ) -> Result<BuildOutcome, BuildError> {
        let user_id = ctx.user_id();
        let executable = executable_path(dir);
        let executable_text = executable.to_string_lossy().into_owned();

        let command = self
            .toolchain
            .go_command(user_id, dir)
            .args(build_args(platform_args, self.toolchain.required_build_flag()))
            .build();
        info!(
            "Session {}: {} in {}",
            ctx.session_id(),
            command.command_line(),
            dir.display()
        );

        let mut handle = self.toolchain.runner().spawn(command).await?;
        let stdout = handle.take_stdout()?;
        let stderr = handle.take_stderr()?;

        let stdout_ctx = ctx.clone();
        let stdout_executable = executable_text.clone();
        let stdout_task = tokio::spawn(async move {
            forward_lines(
                line_stream(stdout, StreamSource::Stdout),
                &stdout_ctx,
                false,
                move |line| StreamMessage::OutputLine {
                    tag: CommandTag::Build,
                    output: stdout_line(line),
                    executable: Some(stdout_executable.clone()),
                },
            )
            .await
        });

        let stderr_summary = forward_lines(
            line_stream(stderr, StreamSource::Stderr),
            ctx,
            true,
            |line| StreamMessage::OutputLine {
                tag: CommandTag::Build,
                output: stderr_line(dir, line),
                executable: Some(executable_text.clone()),
            },
        )
        .await;

        let stdout_summary = stdout_task.await.unwrap_or_else(|e| {
            warn!("Stdout forwarder for session {} failed: {}", ctx.session_id(), e);
            ForwardSummary::default()
        });

        let status = handle.wait().await?;
        debug!(
            "Build exited with {:?}: {} stdout / {} stderr lines",
            status, stdout_summary.lines_read, stderr_summary.lines_read
        );

        let (phase, diagnostics, message) = if status.success() {
            let text = self.toolchain.message(user_id, MessageKey::BuildSucceeded);
            let message = StreamMessage::Completion {
                tag: CommandTag::Build,
                output: banner(MessageKey::BuildSucceeded, &text),
                executable: Some(executable_text),
                next_command,
            };
            (BuildPhase::Succeeded, Vec::new(), message)
        } else {
            let diagnostics = parse_diagnostics(&stderr_summary.captured, dir);
            let text = self.toolchain.message(user_id, MessageKey::BuildFailed);
            let message = StreamMessage::Diagnostics {
                tag: CommandTag::Build,
                output: banner(MessageKey::BuildFailed, &text),
                executable: Some(executable_text),
                diagnostics: diagnostics.clone(),
            };
            (BuildPhase::Failed, diagnostics, message)
        };

        let delivered = ctx.send(message);

        Ok(BuildOutcome {
            phase,
            status,
            executable,
            diagnostics,
            channel_lost: stdout_summary.channel_lost
                || stderr_summary.channel_lost
                || (ctx.has_channel() && !delivered),
        })
    }
}
