//! HTTP surface of the relay
//!
//! | Route                    | Handler                          |
//! |--------------------------|----------------------------------|
//! | `POST /build`            | [`handlers::build`]              |
//! | `POST /go/test`          | [`handlers::go_test`]            |
//! | `POST /playground/build` | [`handlers::playground_build`]   |
//! | `GET /output/ws?sid=..`  | [`ws::output_socket`]            |
//!
//! Every POST needs the `x-user-id` header set by the proxy in front of us.

pub mod handlers;
pub mod response;
pub mod user;
pub mod ws;

pub use response::{ApiError, ApiResult};
pub use user::{CurrentUser, USER_HEADER};

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::build::BuildOrchestrator;
use crate::config::RelayConfig;
use crate::gotest::TestOrchestrator;
use crate::playground::PlaygroundBuilder;
use crate::session::SessionChannelRegistry;
use crate::subprocess::ProcessRunner;
use crate::workspace::{PathResolver, Toolchain, WorkspaceLayout};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionChannelRegistry,
    pub builds: BuildOrchestrator,
    pub tests: TestOrchestrator,
    pub playground: PlaygroundBuilder,
}

impl AppState {
    pub fn new(
        registry: SessionChannelRegistry,
        toolchain: Toolchain,
        resolver: Arc<dyn PathResolver>,
        playground_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            builds: BuildOrchestrator::new(toolchain.clone(), Arc::clone(&resolver)),
            tests: TestOrchestrator::new(toolchain.clone(), resolver),
            playground: PlaygroundBuilder::new(toolchain, playground_dir),
        }
    }

    pub fn from_config(config: &RelayConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self::new(
            SessionChannelRegistry::new(),
            Toolchain::from_config(config, runner),
            Arc::new(WorkspaceLayout::from_config(config)),
            config.workspace.playground_dir.clone(),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/build", post(handlers::build))
        .route("/go/test", post(handlers::go_test))
        .route("/playground/build", post(handlers::playground_build))
        .route("/output/ws", get(ws::output_socket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = router(state);

    info!("buildrelay listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
