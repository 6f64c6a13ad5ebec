//! Frames pushed to an editor session's output channel

use serde::{Serialize, Serializer};

use crate::diagnostics::Diagnostic;

/// Which user action a frame belongs to; serialized as the `cmd` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandTag {
    #[serde(rename = "start-build")]
    StartBuild,
    #[serde(rename = "build")]
    Build,
    #[serde(rename = "start-test")]
    StartTest,
    #[serde(rename = "go test")]
    GoTest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Announces that a command is about to run.
    Start { tag: CommandTag, output: String },
    /// One line of live output.
    OutputLine {
        tag: CommandTag,
        output: String,
        executable: Option<String>,
    },
    /// Final frame of a command that carries no diagnostics.
    Completion {
        tag: CommandTag,
        output: String,
        executable: Option<String>,
        next_command: Option<String>,
    },
    /// Final frame of a failed build.
    Diagnostics {
        tag: CommandTag,
        output: String,
        executable: Option<String>,
        diagnostics: Vec<Diagnostic>,
    },
}

/// Wire shape shared by every variant.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireFrame<'a> {
    cmd: CommandTag,
    output: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    executable: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_command: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a [Diagnostic]>,
}

impl StreamMessage {
    pub fn tag(&self) -> CommandTag {
        match self {
            StreamMessage::Start { tag, .. }
            | StreamMessage::OutputLine { tag, .. }
            | StreamMessage::Completion { tag, .. }
            | StreamMessage::Diagnostics { tag, .. } => *tag,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            StreamMessage::Start { output, .. }
            | StreamMessage::OutputLine { output, .. }
            | StreamMessage::Completion { output, .. }
            | StreamMessage::Diagnostics { output, .. } => output,
        }
    }

    /// Whether this frame ends a command.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamMessage::Completion { .. } | StreamMessage::Diagnostics { .. }
        )
    }

    fn frame(&self) -> WireFrame<'_> {
        let mut frame = WireFrame {
            cmd: self.tag(),
            output: self.output(),
            executable: None,
            next_command: None,
            diagnostics: None,
        };

        match self {
            StreamMessage::Start { .. } => {}
            StreamMessage::OutputLine { executable, .. } => {
                frame.executable = executable.as_deref();
            }
            StreamMessage::Completion {
                executable,
                next_command,
                ..
            } => {
                frame.executable = executable.as_deref();
                frame.next_command = next_command.as_deref();
            }
            StreamMessage::Diagnostics {
                executable,
                diagnostics,
                ..
            } => {
                frame.executable = executable.as_deref();
                frame.diagnostics = Some(diagnostics.as_slice());
            }
        }

        frame
    }
}

impl Serialize for StreamMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.frame().serialize(serializer)
    }
}
