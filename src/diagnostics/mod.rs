//! Structured compiler diagnostics
//!
//! The Go toolchain reports build errors as plain text on standard error:
//!
//! ```text
//! # example.com/hello
//! ./main.go:10:2: undefined: foo
//! ./main.go:12:9: cannot use x (variable of type int) as string value in return statement
//! 	have (int)
//! 	want (string)
//! ```
//!
//! [`parse_diagnostics`] turns those lines into [`Diagnostic`] records the
//! editor can attach to a file and line.

mod parser;

pub use parser::{normalize_path, parse_diagnostics, parse_line, ParsedLine};

use serde::{Deserialize, Serialize};

/// Only one tier is ever reported; the toolchain does not emit warnings here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Absolute path with forward slashes.
    pub file: String,
    /// Zero-based line; `0` when the reported location was not numeric.
    pub line: i64,
    pub severity: Severity,
    pub message: String,
}
