use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

pub const CSV_MIME_TYPE: &str = "text/csv";
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// Identifier of a Drive folder, validated so it can be embedded in a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = SheetsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SheetsError::MissingFolderId);
        }
        if !drive_id_pattern().is_match(trimmed) {
            return Err(SheetsError::InvalidFolderId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

fn drive_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid drive id regex"))
}

/// One entry of a folder listing, as returned by the Drive files endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modified_time: String,
    #[serde(default)]
    pub mime_type: String,
}

impl FolderEntry {
    pub fn label(&self) -> String {
        format!("{}  —  ({})", self.name, self.modified_time)
    }
}

/// Newest first. Entries without a timestamp sort last.
pub fn sort_by_modified_desc(entries: &mut [FolderEntry]) {
    entries.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
}

/// Outcome of sniffing a table for one of several known column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    Found(String),
    NotFound,
}

impl ColumnResolution {
    pub fn column(&self) -> Option<&str> {
        match self {
            ColumnResolution::Found(column) => Some(column),
            ColumnResolution::NotFound => None,
        }
    }
}

/// Splits free text into project numbers: one per line, trimmed, blanks dropped.
pub fn parse_number_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
