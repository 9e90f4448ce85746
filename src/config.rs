use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::auth::ServiceAccountKey;
use crate::domain::FolderId;
use crate::error::SheetsError;

pub const DEFAULT_CONFIG_FILE: &str = "project-sheets.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    #[serde(default)]
    pub gcp_service_account: Option<CredentialsEntry>,
    #[serde(default)]
    pub gcp_service_account_file: Option<String>,
    #[serde(default)]
    pub download_dir: Option<String>,
}

/// The key may be pasted as a JSON string (secrets style) or nested as an object.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CredentialsEntry {
    Inline(String),
    Detailed(ServiceAccountKey),
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: ServiceAccountKey,
    pub folder_id: Option<FolderId>,
    /// Raw value when present but unusable, so the side panel can show it.
    pub folder_id_problem: Option<String>,
    pub download_dir: Option<Utf8PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SheetsError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(SheetsError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| SheetsError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SheetsError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, SheetsError> {
        let credentials = match (config.gcp_service_account, config.gcp_service_account_file) {
            (Some(CredentialsEntry::Detailed(key)), _) => key,
            (Some(CredentialsEntry::Inline(raw)), _) => ServiceAccountKey::from_json(&raw)?,
            (None, Some(file)) => {
                let raw = fs::read_to_string(&file)
                    .map_err(|_| SheetsError::ConfigRead(PathBuf::from(&file)))?;
                ServiceAccountKey::from_json(&raw)?
            }
            (None, None) => return Err(SheetsError::MissingCredentials),
        };
        credentials.validate()?;

        let (folder_id, folder_id_problem) = match config.drive_folder_id {
            Some(raw) if !raw.trim().is_empty() => match raw.parse::<FolderId>() {
                Ok(id) => (Some(id), None),
                Err(_) => (None, Some(raw)),
            },
            _ => (None, None),
        };

        Ok(ResolvedConfig {
            credentials,
            folder_id,
            folder_id_problem,
            download_dir: config.download_dir.map(Utf8PathBuf::from),
        })
    }
}

impl ResolvedConfig {
    /// Text shown under the menu: the folder id, or a warning.
    pub fn folder_summary(&self) -> String {
        match (&self.folder_id, &self.folder_id_problem) {
            (Some(id), _) => id.to_string(),
            (None, Some(raw)) => format!("! drive_folder_id is invalid: {raw}"),
            (None, None) => "! drive_folder_id is not set in the config".to_string(),
        }
    }
}
