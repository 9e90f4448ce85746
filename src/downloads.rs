use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::UserDirs;
use serde::Serialize;

use crate::domain::{CSV_MIME_TYPE, TEXT_MIME_TYPE};
use crate::error::SheetsError;

/// A downloadable result: a file name, a mime type and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn csv(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: CSV_MIME_TYPE,
            bytes,
        }
    }

    pub fn text(file_name: impl Into<String>, text: &str) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: TEXT_MIME_TYPE,
            bytes: text.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub path: String,
    pub bytes: usize,
}

/// Directory artifacts are saved into.
#[derive(Debug, Clone)]
pub struct Downloads {
    root: Utf8PathBuf,
}

impl Downloads {
    /// Uses `preferred` when given, else the user's Downloads folder, else the
    /// current directory.
    pub fn resolve(preferred: Option<Utf8PathBuf>) -> Result<Self, SheetsError> {
        if let Some(root) = preferred {
            return Ok(Self { root });
        }
        let from_user_dirs = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(|dir| dir.to_path_buf()))
            .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok());
        if let Some(root) = from_user_dirs {
            return Ok(Self { root });
        }
        let cwd =
            std::env::current_dir().map_err(|err| SheetsError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| SheetsError::Filesystem("invalid download path".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_path(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn path_for(&self, artifact: &Artifact) -> Utf8PathBuf {
        self.root.join(safe_file_name(&artifact.file_name))
    }

    /// Writes the artifact, replacing any file with the same name.
    pub fn save(&self, artifact: &Artifact) -> Result<SavedArtifact, SheetsError> {
        let path = self.path_for(artifact);
        write_bytes_atomic(&path, &artifact.bytes)?;
        tracing::info!(path = path.as_str(), bytes = artifact.bytes.len(), "saved artifact");
        Ok(SavedArtifact {
            file_name: artifact.file_name.clone(),
            mime_type: artifact.mime_type.to_string(),
            path: path.to_string(),
            bytes: artifact.bytes.len(),
        })
    }
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), SheetsError> {
    let parent = path
        .parent()
        .ok_or_else(|| SheetsError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("project-sheets")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Drive names may contain separators; keep the artifact inside the root.
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}
