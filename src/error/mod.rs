//! Unified error type
//!
//! Each component has its own `thiserror` enum (`ProcessError`, `BuildError`,
//! `ValidationError`, ...). At the HTTP and CLI boundary they are folded into
//! [`RelayError`], which carries a stable numeric code from [`ErrorCode`].

use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// Code reported to the editor whenever a request is aborted
pub const API_CODE_FAILED: i32 = -1;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Session error: {message}")]
    Session {
        code: u16,
        message: String,
        session_id: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Execution error: {message}")]
    Execution {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Build error: {message}")]
    Build {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RelayError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn session(code: u16, message: impl Into<String>, session_id: Option<String>) -> Self {
        Self::Session {
            code,
            message: message.into(),
            session_id,
            source: None,
        }
    }

    pub fn storage(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn execution(code: u16, message: impl Into<String>) -> Self {
        Self::Execution {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn build(code: u16, message: impl Into<String>) -> Self {
        Self::Build {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn validation(code: u16, message: impl Into<String>, field: Option<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Session { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Execution { source: src, .. }
            | Self::Build { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Session { message, .. }
            | Self::Storage { message, .. }
            | Self::Execution { message, .. }
            | Self::Build { message, .. }
            | Self::Validation { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Session { code, .. }
            | Self::Storage { code, .. }
            | Self::Execution { code, .. }
            | Self::Build { code, .. }
            | Self::Validation { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Session { .. } => 3,
            Self::Storage { .. } => 4,
            Self::Execution { .. } => 5,
            Self::Build { .. } => 6,
            Self::Validation { .. } => 8,
            Self::Other { .. } => 1,
        }
    }

    /// The `code` field of an API response for a request that failed with this error.
    pub fn api_code(&self) -> i32 {
        API_CODE_FAILED
    }

    /// Whether the caller sent something unusable, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Build {
                    code: ErrorCode::BUILD_READ_ONLY_TARGET | ErrorCode::BUILD_UNRESOLVED_PATH,
                    ..
                }
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Session {
                message,
                session_id,
                ..
            } => match session_id {
                Some(id) => format!("Session {} error: {}", id, message),
                None => format!("Session error: {}", message),
            },
            Self::Storage { message, path, .. } => match path {
                Some(p) => format!("Storage error at {}: {}", p.display(), message),
                None => format!("Storage error: {}", message),
            },
            Self::Execution { message, .. } => format!("Execution error: {}", message),
            Self::Build { message, .. } => message.clone(),
            Self::Validation { message, field, .. } => match field {
                Some(f) => format!("Validation error for '{}': {}", f, message),
                None => format!("Validation error: {}", message),
            },
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Full message including the source chain, for verbose output.
    pub fn developer_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        message
    }
}

impl From<std::io::Error> for RelayError {
    fn from(err: std::io::Error) -> Self {
        RelayError::storage(ErrorCode::STORAGE_IO_ERROR, err.to_string(), None).with_source(err)
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = RelayError::config("missing port");
        assert!(matches!(err, RelayError::Config { .. }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.code(), ErrorCode::CONFIG_GENERIC);

        let err = RelayError::execution(ErrorCode::EXEC_COMMAND_NOT_FOUND, "go");
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.code(), 4001);
        assert_eq!(err.to_string(), "[E4001] Execution error: go");
    }

    #[test]
    fn test_every_failure_reports_minus_one() {
        let errors = [
            RelayError::other("x"),
            RelayError::build(ErrorCode::BUILD_MODULE_INIT_FAILED, "x"),
            RelayError::validation(ErrorCode::VALIDATION_REQUIRED_FIELD, "x", None),
        ];
        for err in errors {
            assert_eq!(err.api_code(), -1);
        }
    }

    #[test]
    fn test_with_context_and_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RelayError::storage(ErrorCode::STORAGE_PERMISSION_DENIED, "write failed", None)
            .with_context("/ws/main.go")
            .with_source(io);

        assert_eq!(err.user_message(), "Storage error: write failed: /ws/main.go");
        assert!(err.developer_message().contains("caused by: denied"));
    }

    #[test]
    fn test_client_errors() {
        assert!(RelayError::validation(ErrorCode::VALIDATION_GENERIC, "x", None).is_client_error());
        assert!(RelayError::build(ErrorCode::BUILD_READ_ONLY_TARGET, "x").is_client_error());
        assert!(!RelayError::build(ErrorCode::BUILD_MODULE_INIT_FAILED, "x").is_client_error());
        assert!(!RelayError::other("x").is_client_error());
    }

    #[test]
    fn test_validation_user_message_names_field() {
        let err = RelayError::validation(
            ErrorCode::VALIDATION_REQUIRED_FIELD,
            "missing",
            Some("sourceText".to_string()),
        );
        assert_eq!(
            err.user_message(),
            "Validation error for 'sourceText': missing"
        );
    }

    #[test]
    fn test_source_is_optional() {
        use std::error::Error as _;

        let bare = RelayError::execution(ErrorCode::EXEC_SPAWN_FAILED, "go build");
        assert!(bare.source().is_none());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no go");
        let wrapped = bare.with_source(io);
        assert_eq!(wrapped.source().map(|s| s.to_string()), Some("no go".to_string()));
    }
}
