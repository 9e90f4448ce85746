use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::auth::{ServiceAccountAuth, ServiceAccountKey, TokenSource};
use crate::domain::FolderEntry;
use crate::error::SheetsError;

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com";
pub const LIST_FIELDS: &str = "nextPageToken, files(id,name,modifiedTime,mimeType)";

/// One page of a files listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    #[serde(default)]
    pub files: Vec<FolderEntry>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Read-only access to the storage service.
pub trait DriveClient: Send + Sync {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FileListPage, SheetsError>;
    fn download(&self, file_id: &str) -> Result<Vec<u8>, SheetsError>;
}

pub struct DriveHttpClient<T: TokenSource = ServiceAccountAuth> {
    client: Client,
    tokens: T,
    base_url: String,
}

impl DriveHttpClient<ServiceAccountAuth> {
    pub fn new(key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let client = build_http_client()?;
        let tokens = ServiceAccountAuth::new(key, client.clone())?;
        Ok(Self {
            client,
            tokens,
            base_url: DRIVE_BASE_URL.to_string(),
        })
    }
}

impl<T: TokenSource> DriveHttpClient<T> {
    pub fn with_token_source(tokens: T, base_url: &str) -> Result<Self, SheetsError> {
        Ok(Self {
            client: build_http_client()?,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SheetsError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Drive request failed".to_string());
        Err(SheetsError::RemoteStatus { status, message })
    }
}

impl<T: TokenSource> DriveClient for DriveHttpClient<T> {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FileListPage, SheetsError> {
        let token = self.tokens.access_token()?;
        let mut params = vec![("q", query), ("fields", LIST_FIELDS)];
        if let Some(page_token) = page_token {
            params.push(("pageToken", page_token));
        }
        let response = self
            .client
            .get(self.files_url())
            .bearer_auth(token)
            .query(&params)
            .send()
            .map_err(|err| SheetsError::RemoteQuery(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| SheetsError::RemoteQuery(err.to_string()))
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>, SheetsError> {
        let token = self.tokens.access_token()?;
        let url = format!("{}/{}", self.files_url(), file_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .map_err(|err| SheetsError::RemoteQuery(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|err| SheetsError::RemoteQuery(err.to_string()))?;
        tracing::debug!(file_id, bytes = bytes.len(), "downloaded file");
        Ok(bytes.to_vec())
    }
}

fn build_http_client() -> Result<Client, SheetsError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("project-sheets/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| SheetsError::RemoteQuery(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|err| SheetsError::RemoteQuery(err.to_string()))
}

/// Builds the listing query for one parent folder, optionally restricted to a mime type.
pub fn folder_query(folder_id: &str, mime_type: Option<&str>) -> String {
    let mut query = format!("'{}' in parents and trashed=false", escape_literal(folder_id));
    if let Some(mime) = mime_type {
        query.push_str(&format!(" and mimeType='{}'", escape_literal(mime)));
    }
    query
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
