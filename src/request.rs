//! Validated inbound request bodies
//!
//! Bodies are parsed into a JSON value first and then checked field by field,
//! so a bad request is reported with the name of the offending field. The
//! editor's older short keys (`sid`, `file`, `pathtype`, `code`, `nextCmd`)
//! are accepted as aliases.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ErrorCode, RelayError};
use crate::session::SessionId;
use crate::workspace::PathType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{field}' must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// The request field the error is about, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Missing(field)
            | ValidationError::InvalidType { field, .. }
            | ValidationError::Invalid { field, .. } => Some(*field),
            ValidationError::MalformedBody(_) | ValidationError::NotAnObject => None,
        }
    }
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::Missing(_) => ErrorCode::VALIDATION_REQUIRED_FIELD,
            ValidationError::InvalidType { .. } => ErrorCode::VALIDATION_INVALID_TYPE,
            ValidationError::Invalid { .. } => ErrorCode::VALIDATION_INVALID_FORMAT,
            ValidationError::MalformedBody(_) | ValidationError::NotAnObject => {
                ErrorCode::VALIDATION_GENERIC
            }
        };
        RelayError::validation(code, err.to_string(), err.field().map(str::to_string))
    }
}

/// Request fields looked up by their canonical name or an alias.
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn parse(body: &'a Value) -> Result<Self, ValidationError> {
        body.as_object().map(Fields).ok_or(ValidationError::NotAnObject)
    }

    fn get(&self, name: &'static str, aliases: &[&str]) -> Option<&'a Value> {
        std::iter::once(name)
            .chain(aliases.iter().copied())
            .find_map(|key| self.0.get(key))
            .filter(|value| !value.is_null())
    }

    fn optional_str(
        &self,
        name: &'static str,
        aliases: &[&str],
    ) -> Result<Option<&'a str>, ValidationError> {
        match self.get(name, aliases) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(ValidationError::InvalidType {
                field: name,
                expected: "a string",
            }),
        }
    }

    fn required_str(&self, name: &'static str, aliases: &[&str]) -> Result<&'a str, ValidationError> {
        self.optional_str(name, aliases)?
            .ok_or(ValidationError::Missing(name))
    }

    fn non_empty_str(&self, name: &'static str, aliases: &[&str]) -> Result<&'a str, ValidationError> {
        let value = self.required_str(name, aliases)?;
        if value.trim().is_empty() {
            return Err(ValidationError::Invalid {
                field: name,
                reason: "must not be empty".to_string(),
            });
        }
        Ok(value)
    }

    fn path_type(&self, name: &'static str, aliases: &[&str]) -> Result<PathType, ValidationError> {
        let value = self.get(name, aliases).ok_or(ValidationError::Missing(name))?;
        PathType::deserialize(value).map_err(|e| ValidationError::Invalid {
            field: name,
            reason: e.to_string(),
        })
    }
}

pub fn parse_body(bytes: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}

/// Body of `POST /build`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub session: SessionId,
    pub target_file_ref: String,
    pub path_type: PathType,
    pub source_text: String,
    /// Client-side command to run after a successful build, echoed back as-is
    pub next_command: Option<String>,
}

impl BuildRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::parse(body)?;
        Ok(Self {
            session: SessionId::new(fields.non_empty_str("session", &["sid"])?),
            target_file_ref: fields.non_empty_str("targetFileRef", &["file"])?.to_string(),
            path_type: fields.path_type("pathType", &["pathtype"])?,
            source_text: fields.required_str("sourceText", &["code"])?.to_string(),
            next_command: fields
                .optional_str("nextCommand", &["nextCmd"])?
                .map(str::to_string),
        })
    }
}

/// Body of `POST /go/test`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRequest {
    pub session: SessionId,
    pub target_file_ref: String,
    pub path_type: PathType,
}

impl TestRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::parse(body)?;
        Ok(Self {
            session: SessionId::new(fields.non_empty_str("session", &["sid"])?),
            target_file_ref: fields.non_empty_str("targetFileRef", &["file"])?.to_string(),
            path_type: fields.path_type("pathType", &["pathtype"])?,
        })
    }
}

/// Body of `POST /playground/build`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundRequest {
    pub file_name: String,
}

impl PlaygroundRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = Fields::parse(body)?;
        let file_name = fields.non_empty_str("fileName", &[])?;
        validate_playground_name(file_name)?;
        Ok(Self {
            file_name: file_name.to_string(),
        })
    }
}

/// A playground file must be a bare `name.go` inside the playground directory.
pub fn validate_playground_name(file_name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::Invalid {
        field: "fileName",
        reason: reason.to_string(),
    };

    let path = Path::new(file_name);
    if path.file_name().and_then(|name| name.to_str()) != Some(file_name) {
        return Err(invalid("must be a file name without directories"));
    }

    match file_name.strip_suffix(".go") {
        Some(stem) if !stem.is_empty() && !stem.starts_with('.') => Ok(()),
        _ => Err(invalid("must name a .go file")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_request_canonical_fields() {
        let request = BuildRequest::from_value(&json!({
            "session": "s1",
            "targetFileRef": "hello/main.go",
            "pathType": 0,
            "sourceText": "package main",
            "nextCommand": "run"
        }))
        .unwrap();

        assert_eq!(request.session.as_str(), "s1");
        assert_eq!(request.target_file_ref, "hello/main.go");
        assert_eq!(request.path_type, PathType::Workspace);
        assert_eq!(request.source_text, "package main");
        assert_eq!(request.next_command.as_deref(), Some("run"));
    }

    #[test]
    fn test_build_request_legacy_aliases() {
        let request = BuildRequest::from_value(&json!({
            "sid": "s1",
            "file": "a.go",
            "pathtype": "2",
            "code": "",
            "nextCmd": null
        }))
        .unwrap();

        assert_eq!(request.path_type, PathType::GoPath);
        assert_eq!(request.source_text, "");
        assert_eq!(request.next_command, None);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = BuildRequest::from_value(&json!({
            "session": "s1",
            "targetFileRef": "a.go",
            "pathType": 0
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::Missing("sourceText"));
        assert_eq!(err.field(), Some("sourceText"));

        let err = TestRequest::from_value(&json!({"session": "s1", "pathType": 0})).unwrap_err();
        assert_eq!(err, ValidationError::Missing("targetFileRef"));
    }

    #[test]
    fn test_wrong_types() {
        let err = TestRequest::from_value(&json!({
            "session": 42,
            "targetFileRef": "a.go",
            "pathType": 0
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidType {
                field: "session",
                expected: "a string"
            }
        );

        let err = TestRequest::from_value(&json!({
            "session": "s",
            "targetFileRef": "a.go",
            "pathType": 9
        }))
        .unwrap_err();
        assert_eq!(err.field(), Some("pathType"));

        assert_eq!(
            TestRequest::from_value(&json!([1, 2])).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_empty_session_rejected() {
        let err = TestRequest::from_value(&json!({
            "session": " ",
            "targetFileRef": "a.go",
            "pathType": 0
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "session", .. }));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_body(b"{not json"),
            Err(ValidationError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_playground_names() {
        assert!(validate_playground_name("hello.go").is_ok());
        assert!(validate_playground_name("../hello.go").is_err());
        assert!(validate_playground_name("dir/hello.go").is_err());
        assert!(validate_playground_name("hello.txt").is_err());
        assert!(validate_playground_name(".go").is_err());

        let request = PlaygroundRequest::from_value(&json!({"fileName": "x.go"})).unwrap();
        assert_eq!(request.file_name, "x.go");
        assert_eq!(
            PlaygroundRequest::from_value(&json!({})).unwrap_err(),
            ValidationError::Missing("fileName")
        );
    }

    #[test]
    fn test_into_relay_error() {
        let relay: RelayError = ValidationError::Missing("session").into();
        assert_eq!(relay.code(), ErrorCode::VALIDATION_REQUIRED_FIELD);
        assert!(relay.is_client_error());
        assert!(relay.user_message().contains("'session'"));
    }
}
