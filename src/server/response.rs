//! Response envelope shared by every endpoint

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{ErrorCode, RelayError, API_CODE_FAILED};

/// `{code, msg?, data?}`; `code` is `0` on success and `-1` otherwise.
#[derive(Debug, Serialize)]
pub struct ApiResult<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResult<()> {
    pub fn ok() -> Self {
        Self {
            code: 0,
            msg: None,
            data: None,
        }
    }
}

impl<T> ApiResult<T> {
    pub fn with_data(data: T) -> Self {
        Self {
            code: 0,
            msg: None,
            data: Some(data),
        }
    }

    /// A failed result that still carries data, e.g. a playground build log.
    pub fn failed_with(msg: impl Into<String>, data: T) -> Self {
        Self {
            code: API_CODE_FAILED,
            msg: Some(msg.into()),
            data: Some(data),
        }
    }
}

/// Any error that aborted a request.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl<E: Into<RelayError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RelayError::Session {
                code: ErrorCode::SESSION_MISSING_USER,
                ..
            }
            | RelayError::Build {
                code: ErrorCode::BUILD_READ_ONLY_TARGET,
                ..
            } => StatusCode::FORBIDDEN,
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0.developer_message());
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let body = ApiResult::<()> {
            code: self.0.api_code(),
            msg: Some(self.0.user_message()),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}
