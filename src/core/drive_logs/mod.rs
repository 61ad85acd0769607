pub mod drive_api;
pub mod drive_log_service;
pub mod drive_models;
pub mod log_parser;
pub mod paragraphs;

pub use drive_api::{DriveApi, DriveError};
pub use drive_log_service::{DriveLogService, ServiceError};
pub use drive_models::{DriveDocument, DriveFolder, DOCX_MIME_TYPE, FOLDER_MIME_TYPE};
pub use log_parser::StructuredLog;
