//! HTTP handlers for the log endpoints.
//!
//! Handlers pass raw query values straight to the service, which decides what
//! is missing; they only map the outcome to a response.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::drive_logs::{
    DriveApi, DriveDocument, DriveFolder, DriveLogService, ServiceError, StructuredLog,
};

/// The service as wired by `main`: the Drive client is chosen at runtime.
pub type LogService = DriveLogService<Box<dyn DriveApi>>;

#[derive(Clone)]
pub struct AppState {
    pub logs: Arc<LogService>,
}

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Service error that implements IntoResponse.
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!(error = %self.0, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// GET /
pub async fn index() -> &'static str {
    "Drive Log API is running!"
}

/// GET /ping
pub async fn ping() -> &'static str {
    tracing::debug!("Ping route hit");
    "pong"
}

/// GET /list-folders
pub async fn list_folders(
    State(state): State<AppState>,
) -> Result<Json<Vec<DriveFolder>>, ApiError> {
    Ok(Json(state.logs.list_root_folders().await?))
}

/// GET /list-files?folder_id=...
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<DriveDocument>>, ApiError> {
    Ok(Json(
        state.logs.list_documents(query.folder_id.as_deref()).await?,
    ))
}

/// GET /parse-docx?file_id=...
pub async fn parse_docx(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Result<Json<StructuredLog>, ApiError> {
    Ok(Json(
        state.logs.parse_document(query.file_id.as_deref()).await?,
    ))
}
