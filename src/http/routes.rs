use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{index, list_files, list_folders, parse_docx, ping, AppState};

/// Builds the full API router.
///
/// - `GET /` - liveness text
/// - `GET /ping` - `pong`
/// - `GET /list-folders` - folders under the configured root
/// - `GET /list-files?folder_id=` - .docx files in a folder
/// - `GET /parse-docx?file_id=` - structured log of one document
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/list-folders", get(list_folders))
        .route("/list-files", get(list_files))
        .route("/parse-docx", get(parse_docx))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
