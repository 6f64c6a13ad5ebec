use async_trait::async_trait;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessHandle, ProcessOutput, ProcessRunner};

type ArgsMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Scriptable runner used by tests in place of the real toolchain.
///
/// Expectations are checked in registration order; the first one whose
/// program and argument matcher accept a command answers it. Every command
/// is recorded, matched or not.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    calls: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct MockExpectation {
    program: String,
    args: Option<ArgsMatcher>,
    /// `None` answers as if the program were missing from PATH.
    reply: Option<ProcessOutput>,
    limit: Option<usize>,
    hits: usize,
}

impl MockExpectation {
    fn accepts(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self.args.as_ref().map_or(true, |matcher| matcher(&command.args))
    }

    fn answer(&mut self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.hits += 1;
        if let Some(limit) = self.limit.filter(|limit| self.hits > *limit) {
            return Err(ProcessError::MockExpectationNotMet(format!(
                "Command '{}' called {} times, expected {}",
                command.program, self.hits, limit
            )));
        }

        self.reply
            .clone()
            .ok_or_else(|| ProcessError::CommandNotFound(command.program.clone()))
    }

    fn output_mut(&mut self) -> &mut ProcessOutput {
        self.reply.get_or_insert_with(quiet_success)
    }
}

fn quiet_success() -> ProcessOutput {
    ProcessOutput {
        status: ExitStatus::Success,
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::from_millis(10),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start scripting the answer for `program`. Nothing is registered
    /// until [`MockCommandConfig::finish`] is called.
    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation {
                program: program.to_string(),
                args: None,
                reply: Some(quiet_success()),
                limit: None,
                hits: 0,
            },
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        lock(&self.calls)
            .iter()
            .filter(|command| command.program == program)
            .count()
            == times
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        lock(&self.calls).clone()
    }

    fn respond(&self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        lock(&self.calls).push(command.clone());

        let mut expectations = lock(&self.expectations);
        match expectations.iter_mut().find(|e| e.accepts(command)) {
            Some(expectation) => expectation.answer(command),
            None => Err(ProcessError::MockExpectationNotMet(format!(
                "No expectation found for command: {}",
                command.command_line()
            ))),
        }
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.respond(&command)
    }

    /// Replays the scripted output as if the process had already exited.
    async fn spawn(&self, command: ProcessCommand) -> Result<ProcessHandle, ProcessError> {
        let ProcessOutput {
            status,
            stdout,
            stderr,
            ..
        } = self.respond(&command)?;

        Ok(ProcessHandle::new(
            Box::pin(Cursor::new(stdout.into_bytes())),
            Box::pin(Cursor::new(stderr.into_bytes())),
            Box::pin(async move { Ok(status) }),
        ))
    }
}

/// Builder for a single scripted answer.
pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args = Some(Box::new(matcher));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.output_mut().stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.output_mut().stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.output_mut().status = match code {
            0 => ExitStatus::Success,
            code => ExitStatus::Error(code),
        };
        self
    }

    pub fn returns_success(self) -> Self {
        self.returns_exit_code(0)
    }

    /// Behave as if the program is missing from PATH.
    pub fn not_found(mut self) -> Self {
        self.expectation.reply = None;
        self
    }

    /// Fail any call beyond the `n`th.
    pub fn times(mut self, n: usize) -> Self {
        self.expectation.limit = Some(n);
        self
    }

    pub fn finish(self) {
        lock(&self.runner.expectations).push(self.expectation);
    }
}
