use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use super::response::{ApiError, ApiResult};
use super::user::CurrentUser;
use super::AppState;
use crate::playground::PlaygroundBuild;
use crate::presentation::MessageKey;
use crate::request::{parse_body, BuildRequest, PlaygroundRequest, TestRequest};

/// `POST /build`
///
/// Responds once the build has finished. A compile that fails is still a
/// successful request; its diagnostics go out over the session's channel.
pub async fn build(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<ApiResult<()>>, ApiError> {
    let request = BuildRequest::from_value(&parse_body(&body)?)?;
    let ctx = state.registry.context(request.session.clone(), user.id()).await;

    let outcome = state.builds.build(&ctx, &request).await?;
    info!(
        "User [{}] built {} for session {}: {}",
        user.id(),
        request.target_file_ref,
        request.session,
        outcome.phase
    );
    if outcome.channel_lost {
        warn!(
            "Session {} lost its output channel during the build",
            request.session
        );
    }

    Ok(Json(ApiResult::ok()))
}

/// `POST /go/test`
///
/// Returns as soon as `go test` is running.
pub async fn go_test(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<ApiResult<()>>, ApiError> {
    let request = TestRequest::from_value(&parse_body(&body)?)?;
    let ctx = state.registry.context(request.session.clone(), user.id()).await;

    let run = state.tests.start(ctx, &request).await?;
    info!(
        "User [{}] started test run {} for {}",
        user.id(),
        run.run_id,
        request.target_file_ref
    );

    Ok(Json(ApiResult::ok()))
}

/// `POST /playground/build`
pub async fn playground_build(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Bytes,
) -> Result<Json<ApiResult<PlaygroundBuild>>, ApiError> {
    let request = PlaygroundRequest::from_value(&parse_body(&body)?)?;
    let result = state.playground.build(user.id(), &request.file_name).await?;

    if result.succeeded() {
        Ok(Json(ApiResult::with_data(result)))
    } else {
        let msg = state
            .playground
            .toolchain()
            .message(user.id(), MessageKey::BuildFailed);
        Ok(Json(ApiResult::failed_with(msg, result)))
    }
}
