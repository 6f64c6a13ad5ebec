use std::path::{Component, Path, PathBuf};
use tracing::trace;

use super::{Diagnostic, Severity};

/// Classification of a single line of compiler error output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Tab-indented detail belonging to the previous diagnostic.
    Continuation,
    Diagnostic(Diagnostic),
    /// Not diagnostic-shaped.
    Skip,
}

/// Join `file` onto `workdir` and resolve `.`/`..` lexically.
///
/// Absolute paths are kept as they are. Separators come back as `/`.
pub fn normalize_path(workdir: &Path, file: &str) -> String {
    let joined = if Path::new(file).is_absolute() {
        PathBuf::from(file)
    } else {
        workdir.join(file)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(clean.components().next_back(), Some(Component::Normal(_))) {
                    clean.pop();
                } else if !clean.has_root() {
                    clean.push("..");
                }
            }
            other => clean.push(other.as_os_str()),
        }
    }

    clean.to_string_lossy().replace('\\', "/")
}

/// Drop a leading `<column>:` left over after the line number.
fn skip_column(message: &str) -> &str {
    match message.split_once(':') {
        Some((column, rest)) if !column.is_empty() && column.bytes().all(|b| b.is_ascii_digit()) => {
            rest
        }
        _ => message,
    }
}

pub fn parse_line(line: &str, workdir: &Path) -> ParsedLine {
    if line.starts_with('\t') {
        return ParsedLine::Continuation;
    }

    let Some((file_part, rest)) = line.split_once(':') else {
        return ParsedLine::Skip;
    };

    let (line_token, msg_token) = rest.split_once(':').unwrap_or((rest, ""));
    let reported = line_token
        .parse::<i64>()
        .ok()
        .and_then(|reported| reported.checked_sub(1));
    let (line, message) = match reported {
        Some(line) => {
            let message = skip_column(msg_token);
            let message = message.strip_prefix(' ').unwrap_or(message);
            (line, message.to_string())
        }
        None => (0, rest.to_string()),
    };

    ParsedLine::Diagnostic(Diagnostic {
        file: normalize_path(workdir, file_part),
        line,
        severity: Severity::Error,
        message,
    })
}

/// Turn captured standard-error lines into diagnostics, in order.
///
/// A leading `# package` header is discarded. Tab-indented lines are folded
/// into the previous diagnostic's message on a new line; with no previous
/// diagnostic they are dropped. Lines without a colon are dropped.
pub fn parse_diagnostics<S: AsRef<str>>(lines: &[S], workdir: &Path) -> Vec<Diagnostic> {
    let body = match lines.first() {
        Some(first) if first.as_ref().starts_with('#') => &lines[1..],
        _ => lines,
    };

    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for line in body {
        let line = line.as_ref();
        match parse_line(line, workdir) {
            ParsedLine::Continuation => match diagnostics.last_mut() {
                Some(last) => {
                    last.message.push('\n');
                    last.message.push_str(line);
                }
                None => trace!("Dropping continuation with no diagnostic before it: {:?}", line),
            },
            ParsedLine::Diagnostic(diagnostic) => diagnostics.push(diagnostic),
            ParsedLine::Skip => trace!("Skipping non-diagnostic line: {:?}", line),
        }
    }

    diagnostics
}
