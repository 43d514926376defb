//! HTTP endpoints
//!
//! - `GET /api/token?room=<name>`: `{ "token": ... }`, or `{ "error": ... }` with
//!   500 on issuance failure and 400 on a malformed query
//! - `GET /api/config-status`: which credentials are configured, never their values
//! - `GET /health`: liveness

use crate::auth::{IssueError, TokenIssuer};
use crate::config::ConfigStatus;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    /// Deployment label reported by the status probe
    pub environment: String,
}

impl AppState {
    pub fn new(issuer: TokenIssuer, environment: impl Into<String>) -> Self {
        Self {
            issuer: Arc::new(issuer),
            environment: environment.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    room: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/token", get(token_handler))
        .route("/api/config-status", get(config_status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn token_handler(
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Malformed token request");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    match state.issuer.issue_for_room(query.room.as_deref()) {
        Ok(token) => {
            let claims = token.claims();
            let room = claims.scope.app.channels.first().map(|c| c.name.as_str());
            info!(room = room.unwrap_or_default(), jti = %claims.jti, "Token issued");

            Json(TokenResponse {
                token: token.into_string(),
            })
            .into_response()
        }
        Err(e) => {
            match &e {
                IssueError::Configuration(_) => warn!(error = %e, "Token request refused"),
                IssueError::Issuance(_) => error!(error = %e, "Token issuance failed"),
            }
            e.into_response()
        }
    }
}

async fn config_status_handler(State(state): State<AppState>) -> Json<ConfigStatus> {
    Json(state.issuer.config().status(&state.environment))
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_server<F>(bind_addr: SocketAddr, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
