mod auth;
mod handlers;

pub use auth::SECRET_HEADER;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::api::MetadataApi;
use crate::clock::SystemClock;
use crate::error::Error;
use crate::host::{HostBridge, OpenDocuments};
use crate::provenance::ProvenanceService;

/// Shared state behind every `/api/*` handler.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn MetadataApi>,
    pub bridge: Arc<dyn HostBridge>,
    pub open_docs: Arc<dyn OpenDocuments>,
    pub provenance: Arc<tokio::sync::Mutex<ProvenanceService<SystemClock>>>,
    pub workspace_root: PathBuf,
    pub secret: String,
    pub org_id: String,
    pub instance_url: String,
    pub started_at: Instant,
}

/// Build the helper server router. Every route sits behind the shared-secret
/// check; CORS stays permissive because the only caller is the host panel's
/// webview on localhost.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/debugLogs", get(handlers::list_debug_logs))
        .route("/api/debugLogs/delete", post(handlers::delete_debug_logs))
        .route("/api/debugLogs/:id", delete(handlers::delete_debug_log))
        .route(
            "/api/debugLogs/:id/download",
            get(handlers::download_debug_log),
        )
        .route(
            "/api/debugLogs/:id/methodName",
            get(handlers::debug_log_method_name),
        )
        .route("/api/users", get(handlers::list_users))
        .route("/api/files", get(handlers::list_component_files))
        .route("/api/files/open", post(handlers::open_file))
        .route("/api/lastModified", get(handlers::last_modified))
        .route("/api/status", get(handlers::status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_secret,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Failure envelope for the `/api/*` surface: every error becomes
/// `{ "success": false, "error": … }` with a matching HTTP status.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::InvalidPath(_) | Error::OutsideWorkspace(_) => StatusCode::BAD_REQUEST,
            Error::Remote(_) | Error::Http(_) | Error::Payload(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}
