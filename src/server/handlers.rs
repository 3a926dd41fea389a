use axum::extract::{Path as UrlPath, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::{ApiError, AppState};
use crate::api::extract_entry_method;
use crate::bundle;
use crate::error::Error;
use crate::metadata::classify;
use crate::picker;
use crate::provenance::RefreshOutcome;

#[derive(Deserialize)]
pub(crate) struct LogsQuery {
    user: Option<String>,
}

pub(crate) async fn list_debug_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Value>, ApiError> {
    let logs = state.api.list_debug_logs(query.user.as_deref()).await?;
    Ok(Json(json!({ "success": true, "logs": logs })))
}

pub(crate) async fn download_debug_log(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state.api.fetch_log_body(&id).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "text/plain; charset=utf-8".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}.log\""),
        ),
    ];
    Ok((headers, body))
}

pub(crate) async fn debug_log_method_name(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Value>, ApiError> {
    let body = state.api.fetch_log_body(&id).await?;
    Ok(Json(
        json!({ "success": true, "methodName": extract_entry_method(&body) }),
    ))
}

pub(crate) async fn delete_debug_log(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Value>, ApiError> {
    state.api.delete_log(&id).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub(crate) struct DeleteLogsRequest {
    ids: Vec<String>,
}

pub(crate) async fn delete_debug_logs(
    State(state): State<AppState>,
    Json(request): Json<DeleteLogsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut failed = 0usize;
    for id in &request.ids {
        if let Err(e) = state.api.delete_log(id).await {
            warn!("failed to delete log {id}: {e}");
            failed += 1;
        }
    }

    if failed == 0 {
        Ok(Json(
            json!({ "success": true, "deleted": request.ids.len() }),
        ))
    } else {
        Err(ApiError::bad_gateway(format!(
            "failed to delete {failed} of {} logs",
            request.ids.len()
        )))
    }
}

#[derive(Deserialize)]
pub(crate) struct UsersQuery {
    search: Option<String>,
}

pub(crate) async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Value>, ApiError> {
    let users = state.api.list_users(query.search.as_deref()).await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

#[derive(Deserialize)]
pub(crate) struct FilesQuery {
    path: String,
}

pub(crate) async fn list_component_files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Value>, ApiError> {
    let path = resolve_workspace_path(&state, &query.path)?;

    let files = bundle::enumerate(&path, state.open_docs.as_ref());
    let entries = picker::format(&files);

    Ok(Json(
        json!({ "success": true, "files": files, "entries": entries }),
    ))
}

pub(crate) async fn last_modified(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<Value>, ApiError> {
    let path = resolve_workspace_path(&state, &query.path)?;
    let Some(info) = classify(&path) else {
        return Err(ApiError::bad_request(format!(
            "not a recognized metadata file: {}",
            query.path
        )));
    };

    let mut provenance = state.provenance.lock().await;
    let outcome = provenance.refresh(&info).await?;

    let (record, external_change, debounced) = match outcome {
        RefreshOutcome::Unchanged(record) => (Some(record), false, false),
        RefreshOutcome::ExternalChange(record) => (Some(record), true, false),
        RefreshOutcome::Debounced => (provenance.stored(&info), false, true),
        RefreshOutcome::Superseded => (provenance.stored(&info), false, false),
    };

    Ok(Json(json!({
        "success": true,
        "metadataType": info.metadata_type,
        "apiName": info.api_name,
        "record": record,
        "externalChange": external_change,
        "debounced": debounced,
    })))
}

#[derive(Deserialize)]
pub(crate) struct OpenRequest {
    path: String,
}

pub(crate) async fn open_file(
    State(state): State<AppState>,
    Json(request): Json<OpenRequest>,
) -> Result<Json<Value>, ApiError> {
    let path = resolve_workspace_path(&state, &request.path)?;
    state.bridge.open_file(&path).await?;
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "orgId": state.org_id,
        "instanceUrl": state.instance_url,
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Resolve a client-supplied path and require it to stay inside the
/// workspace root. Relative paths are taken relative to the root.
fn resolve_workspace_path(state: &AppState, raw: &str) -> Result<PathBuf, ApiError> {
    let requested = Path::new(raw);
    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        state.workspace_root.join(requested)
    };

    let canonical = absolute
        .canonicalize()
        .map_err(|_| ApiError::bad_request(format!("no such file: {raw}")))?;

    let root = state.workspace_root.canonicalize().map_err(|source| {
        ApiError::from(Error::Io {
            path: state.workspace_root.clone(),
            source,
        })
    })?;

    if !canonical.starts_with(&root) {
        return Err(Error::OutsideWorkspace(canonical).into());
    }

    Ok(canonical)
}
