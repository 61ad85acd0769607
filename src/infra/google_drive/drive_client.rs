use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use super::credentials::AccessTokenProvider;
use crate::core::drive_logs::{
    DriveApi, DriveDocument, DriveError, DriveFolder, DOCX_MIME_TYPE, FOLDER_MIME_TYPE,
};

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_PAGE_SIZE: u32 = 100;
const DOCUMENT_PAGE_SIZE: u32 = 50;

/// Drive v3 REST client. It only exposes the calls the log service needs.
pub struct GoogleDriveClient {
    client: Client,
    base_url: String,
    auth: Arc<dyn AccessTokenProvider>,
}

/// `files.list` response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct FileList<T> {
    #[serde(default)]
    files: Vec<T>,
}

impl GoogleDriveClient {
    pub fn new(auth: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(auth, DRIVE_API_BASE)
    }

    /// Points the client at another Drive-compatible endpoint.
    pub fn with_base_url(auth: Arc<dyn AccessTokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Quotes a value for use inside a Drive `q` expression.
    fn quote(value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn folders_query(parent_id: &str) -> String {
        format!(
            "{} in parents and mimeType='{}' and trashed = false",
            Self::quote(parent_id),
            FOLDER_MIME_TYPE
        )
    }

    fn documents_query(folder_id: &str) -> String {
        format!(
            "{} in parents and mimeType='{}'",
            Self::quote(folder_id),
            DOCX_MIME_TYPE
        )
    }

    async fn bearer(&self) -> Result<String, DriveError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| DriveError::Auth(e.to_string()))
    }

    /// Turns a non-2xx response into `DriveError::Api` with Google's message body.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(%status, "Drive rejected credentials or lacks permission");
        }
        Err(DriveError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn list_files<T>(
        &self,
        query: &str,
        fields: &str,
        page_size: u32,
    ) -> Result<Vec<T>, DriveError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let token = self.bearer().await?;
        let page_size = page_size.to_string();
        tracing::debug!(query, "Listing Drive files");

        let response = self
            .client
            .get(format!("{}/files", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("fields", fields),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;

        let list: FileList<T> = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;
        Ok(list.files)
    }
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<DriveFolder>, DriveError> {
        self.list_files(
            &Self::folders_query(parent_id),
            "files(id, name, createdTime)",
            FOLDER_PAGE_SIZE,
        )
        .await
    }

    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DriveDocument>, DriveError> {
        self.list_files(
            &Self::documents_query(folder_id),
            "files(id, name, modifiedTime)",
            DOCUMENT_PAGE_SIZE,
        )
        .await
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let token = self.bearer().await?;
        tracing::debug!(file_id, "Downloading Drive file");

        let response = self
            .client
            .get(format!("{}/files/{}", self.base_url, file_id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;

        let bytes = Self::check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| DriveError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
