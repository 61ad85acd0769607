use super::drive_api::{DriveApi, DriveError};
use super::drive_models::{DriveDocument, DriveFolder};
use super::log_parser::{parse_lines, StructuredLog};
use super::paragraphs::{extract_paragraphs, DocumentError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Missing {0}")]
    MissingParameter(&'static str),
    #[error("Root folder not set.")]
    RootFolderNotSet,
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl ServiceError {
    /// True when the caller sent a bad request rather than something failing downstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::MissingParameter(_) | ServiceError::RootFolderNotSet
        )
    }
}

/// Lists log folders and documents under a fixed root and turns documents into
/// structured logs. Nothing is cached: every call goes to Drive.
pub struct DriveLogService<D: DriveApi> {
    drive: D,
    root_folder_id: String,
}

impl<D: DriveApi> DriveLogService<D> {
    pub fn new(drive: D, root_folder_id: impl Into<String>) -> Self {
        Self {
            drive,
            root_folder_id: root_folder_id.into(),
        }
    }

    pub fn root_folder_id(&self) -> &str {
        &self.root_folder_id
    }

    pub async fn list_root_folders(&self) -> Result<Vec<DriveFolder>, ServiceError> {
        if self.root_folder_id.trim().is_empty() {
            return Err(ServiceError::RootFolderNotSet);
        }

        let folders = self.drive.list_folders(&self.root_folder_id).await?;
        tracing::debug!(count = folders.len(), "Listed root folders");
        Ok(folders)
    }

    pub async fn list_documents(
        &self,
        folder_id: Option<&str>,
    ) -> Result<Vec<DriveDocument>, ServiceError> {
        let folder_id = required(folder_id, "folder_id")?;

        let documents = self.drive.list_documents(folder_id).await?;
        tracing::debug!(folder_id, count = documents.len(), "Listed documents");
        Ok(documents)
    }

    /// Downloads a .docx and parses its paragraphs into sites, tasks and subtasks.
    pub async fn parse_document(&self, file_id: Option<&str>) -> Result<StructuredLog, ServiceError> {
        let file_id = required(file_id, "file_id")?;

        let bytes = self.drive.download(file_id).await?;
        let lines = extract_paragraphs(&bytes)?;
        let log = parse_lines(lines);

        tracing::info!(
            file_id,
            bytes = bytes.len(),
            sites = log.len(),
            "Parsed log document"
        );
        Ok(log)
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::MissingParameter(name)),
    }
}
