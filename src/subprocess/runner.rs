use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;

use super::error::ProcessError;

/// One invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Overlay applied on top of the inherited environment.
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessCommand {
    /// Program and arguments joined for logs and error messages
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len());
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return match code {
                0 => ExitStatus::Success,
                code => ExitStatus::Error(code),
            };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitStatus::Signal(signal);
            }
        }
        ExitStatus::Error(1)
    }
}

pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;
pub type StatusFuture = Pin<Box<dyn Future<Output = Result<ExitStatus, ProcessError>> + Send>>;

/// A running process: two live output pipes and a pending exit status.
///
/// `wait` consumes the handle. Pipes that were not taken beforehand are
/// closed first so an unread pipe can never stall the child.
pub struct ProcessHandle {
    stdout: Option<ByteStream>,
    stderr: Option<ByteStream>,
    status: StatusFuture,
}

impl ProcessHandle {
    pub fn new(stdout: ByteStream, stderr: ByteStream, status: StatusFuture) -> Self {
        Self {
            stdout: Some(stdout),
            stderr: Some(stderr),
            status,
        }
    }

    pub fn take_stdout(&mut self) -> Result<ByteStream, ProcessError> {
        self.stdout
            .take()
            .ok_or(ProcessError::PipeUnavailable("stdout"))
    }

    pub fn take_stderr(&mut self) -> Result<ByteStream, ProcessError> {
        self.stderr
            .take()
            .ok_or(ProcessError::PipeUnavailable("stderr"))
    }

    pub async fn wait(self) -> Result<ExitStatus, ProcessError> {
        let ProcessHandle {
            stdout,
            stderr,
            status,
        } = self;
        drop(stdout);
        drop(stderr);
        status.await
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion and capture both output streams.
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;

    /// Start the process and hand back its live pipes.
    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessHandle, ProcessError>;
}

pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn trace_start(command: &ProcessCommand) {
        tracing::debug!("Running {}", command.command_line());
        if !command.env.is_empty() {
            tracing::trace!(overlay = ?command.env, "environment overlay");
        }
        if let Some(dir) = &command.working_dir {
            tracing::trace!(dir = %dir.display(), "working directory");
        }
    }

    async fn check_working_dir(dir: Option<&Path>) -> Result<(), ProcessError> {
        let Some(dir) = dir else {
            return Ok(());
        };

        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(ProcessError::InvalidWorkingDir(dir.to_path_buf())),
        }
    }

    fn to_tokio(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(error: std::io::Error, command: &ProcessCommand) -> ProcessError {
        if error.kind() == std::io::ErrorKind::NotFound {
            tracing::error!("'{}' is not installed or not on PATH", command.program);
            return ProcessError::CommandNotFound(command.program.clone());
        }
        tracing::error!("Could not start {}: {}", command.command_line(), error);
        ProcessError::SpawnFailed {
            command: command.command_line(),
            source: error,
        }
    }

    async fn spawn_child(command: &ProcessCommand) -> Result<tokio::process::Child, ProcessError> {
        Self::check_working_dir(command.working_dir.as_deref()).await?;
        Self::to_tokio(command)
            .spawn()
            .map_err(|e| Self::spawn_error(e, command))
    }

    fn trace_finish(output: &ProcessOutput, command: &ProcessCommand) {
        match output.status {
            ExitStatus::Signal(signal) => tracing::warn!(
                "{} killed by signal {} after {:?}",
                command.command_line(),
                signal,
                output.duration
            ),
            ref status => {
                tracing::debug!(
                    "{} finished with {:?} after {:?}",
                    command.command_line(),
                    status,
                    output.duration
                );
                if !status.success() && !output.stderr.is_empty() {
                    tracing::trace!("stderr of failed command:\n{}", output.stderr);
                }
            }
        }
    }

    /// Create the exit status future for a child whose pipes were taken
    fn status_future(mut child: tokio::process::Child, command_line: String) -> StatusFuture {
        Box::pin(async move {
            let start = Instant::now();
            let status = child.wait().await.map_err(|e| ProcessError::WaitFailed {
                command: command_line.clone(),
                source: e,
            })?;
            let status = ExitStatus::from(status);
            tracing::debug!(
                "'{}' exited with {:?} after {:?} of waiting",
                command_line,
                status,
                start.elapsed()
            );
            Ok(status)
        })
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let start = Instant::now();
        Self::trace_start(&command);

        let child = Self::spawn_child(&command).await?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ProcessError::WaitFailed {
                command: command.command_line(),
                source: e,
            })?;

        let result = ProcessOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };

        Self::trace_finish(&result, &command);
        Ok(result)
    }

    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessHandle, ProcessError> {
        Self::trace_start(&command);

        let mut child = Self::spawn_child(&command).await?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProcessError::PipeUnavailable("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::PipeUnavailable("stderr"))?;

        Ok(ProcessHandle::new(
            Box::pin(stdout),
            Box::pin(stderr),
            Self::status_future(child, command.command_line()),
        ))
    }
}
