use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use super::AppState;

/// Header the panel must present on every request.
pub const SECRET_HEADER: &str = "x-sfnav-secret";

pub(crate) async fn require_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    if presented != Some(state.secret.as_str()) {
        warn!(
            "rejected request to {} without a valid shared secret",
            request.uri().path()
        );
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "invalid or missing shared secret" })),
        )
            .into_response();
    }

    next.run(request).await
}
