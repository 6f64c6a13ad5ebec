//! User identity set by the authenticating proxy in front of the relay

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::response::ApiError;
use crate::error::{ErrorCode, RelayError};

pub const USER_HEADER: &str = "x-user-id";

/// The user a request acts for, taken from the `x-user-id` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

fn user_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts).map(CurrentUser).ok_or_else(|| {
            ApiError(RelayError::session(
                ErrorCode::SESSION_MISSING_USER,
                format!("missing {USER_HEADER} header"),
                None,
            ))
        })
    }
}
