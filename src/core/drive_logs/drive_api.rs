use super::drive_models::{DriveDocument, DriveFolder};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Google Drive API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Google Drive request failed: {0}")]
    Transport(String),
}

/// The slice of the Google Drive API the log service needs.
///
/// The infra layer implements this over HTTP; tests use an in-memory fake.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Non-trashed folders directly inside `parent_id`.
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<DriveFolder>, DriveError>;

    /// .docx files directly inside `folder_id`.
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DriveDocument>, DriveError>;

    /// Raw bytes of a file.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;
}

// Lets the service hold whichever client `main` picked at runtime.
#[async_trait]
impl DriveApi for Box<dyn DriveApi> {
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<DriveFolder>, DriveError> {
        (**self).list_folders(parent_id).await
    }

    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DriveDocument>, DriveError> {
        (**self).list_documents(folder_id).await
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        (**self).download(file_id).await
    }
}
