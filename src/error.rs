use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SheetsError {
    #[error("missing config file project-sheets.json in current directory")]
    #[diagnostic(help("create project-sheets.json or pass --config <path>"))]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing service account credentials (gcp_service_account)")]
    #[diagnostic(help(
        "set gcp_service_account (JSON key) or gcp_service_account_file in the config"
    ))]
    MissingCredentials,

    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    #[error("drive_folder_id is not set")]
    #[diagnostic(help("set drive_folder_id in the config"))]
    MissingFolderId,

    #[error("invalid Drive folder id: {0}")]
    InvalidFolderId(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("Drive request failed: {0}")]
    RemoteQuery(String),

    #[error("Drive returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("failed to parse CSV: {0}")]
    Parse(String),

    #[error("column not present in table: {0}")]
    ColumnMissing(String),

    #[error("none of the known columns [{}] found; available: [{}]", candidates.join(", "), available.join(", "))]
    #[diagnostic(help("pick one of the available columns with --column"))]
    ColumnNotFound {
        candidates: Vec<String>,
        available: Vec<String>,
    },

    #[error("file not found in Drive folder: {0}")]
    FileNotFound(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl SheetsError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SheetsError::MissingConfig
                | SheetsError::ConfigRead(_)
                | SheetsError::ConfigParse(_)
                | SheetsError::MissingCredentials
                | SheetsError::InvalidCredentials(_)
                | SheetsError::MissingFolderId
                | SheetsError::InvalidFolderId(_)
        )
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SheetsError::Auth(_) | SheetsError::RemoteQuery(_) | SheetsError::RemoteStatus { .. }
        )
    }
}
