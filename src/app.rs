use std::time::{Duration, Instant};

use serde::Serialize;

use crate::committee::{self, CommitteeRoster, Extraction};
use crate::domain::{CSV_MIME_TYPE, ColumnResolution, FolderEntry, FolderId, sort_by_modified_desc};
use crate::downloads::{Artifact, Downloads, SavedArtifact};
use crate::drive::DriveClient;
use crate::error::SheetsError;
use crate::existence::{self, MatchResult};
use crate::folder::FolderIndex;
use crate::projects::{self, ProjectList};
use crate::table::{CsvLoader, CsvTable};

#[derive(Debug, Clone, Serialize)]
pub struct FilesResult {
    pub folder_id: String,
    pub files: Vec<FolderEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsResult {
    pub file: FolderEntry,
    pub columns: Vec<String>,
    pub rows: usize,
    pub detected: bool,
    pub list: ProjectList,
    pub saved: Vec<SavedArtifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitteesResult {
    pub file: Option<FolderEntry>,
    pub roster: CommitteeRoster,
    pub saved: Vec<SavedArtifact>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub checked: usize,
    pub result: MatchResult,
    pub saved: Vec<SavedArtifact>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Entry point shared by the dashboard and the subcommands.
pub struct App<C: DriveClient> {
    drive: C,
    folder_id: Option<FolderId>,
    /// Configured value that failed validation, reported by folder operations.
    folder_problem: Option<String>,
    downloads: Downloads,
}

impl<C: DriveClient> App<C> {
    pub fn new(drive: C, folder_id: Option<FolderId>, downloads: Downloads) -> Self {
        Self {
            drive,
            folder_id,
            folder_problem: None,
            downloads,
        }
    }

    pub fn with_folder_problem(mut self, raw: Option<String>) -> Self {
        self.folder_problem = raw;
        self
    }

    pub fn folder_id(&self) -> Option<&FolderId> {
        self.folder_id.as_ref()
    }

    pub fn drive(&self) -> &C {
        &self.drive
    }

    pub fn downloads(&self) -> &Downloads {
        &self.downloads
    }

    /// The configured folder, or the configuration error that explains its absence.
    pub fn require_folder(&self) -> Result<&FolderId, SheetsError> {
        match (&self.folder_id, &self.folder_problem) {
            (Some(id), _) => Ok(id),
            (None, Some(raw)) => Err(SheetsError::InvalidFolderId(raw.clone())),
            (None, None) => Err(SheetsError::MissingFolderId),
        }
    }

    /// CSV entries of the folder, newest first.
    pub fn csv_files(&self, sink: &dyn ProgressSink) -> Result<Vec<FolderEntry>, SheetsError> {
        self.list_sorted(Some(CSV_MIME_TYPE), sink)
    }

    /// Every entry of the folder, newest first.
    pub fn all_files(&self, sink: &dyn ProgressSink) -> Result<Vec<FolderEntry>, SheetsError> {
        self.list_sorted(None, sink)
    }

    pub fn files(&self, all: bool, sink: &dyn ProgressSink) -> Result<FilesResult, SheetsError> {
        let files = if all {
            self.all_files(sink)?
        } else {
            self.csv_files(sink)?
        };
        Ok(FilesResult {
            folder_id: self.require_folder()?.to_string(),
            files,
        })
    }

    fn list_sorted(
        &self,
        mime_type: Option<&str>,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<FolderEntry>, SheetsError> {
        let folder = self.require_folder()?;
        sink.event(ProgressEvent::new(format!(
            "phase=List; listing folder{}",
            mime_type.map(|m| format!(" ({m})")).unwrap_or_default()
        )));
        let start = Instant::now();
        let mut entries = FolderIndex::new(&self.drive).list(folder.as_str(), mime_type)?;
        sort_by_modified_desc(&mut entries);
        sink.event(ProgressEvent {
            message: format!(
                "drive.list entries={} latency_ms={}",
                entries.len(),
                start.elapsed().as_millis()
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(entries)
    }

    pub fn load_table(
        &self,
        entry: &FolderEntry,
        sink: &dyn ProgressSink,
    ) -> Result<CsvTable, SheetsError> {
        sink.event(ProgressEvent::new(format!("phase=Load; downloading {}", entry.name)));
        let start = Instant::now();
        let table = CsvLoader::new(&self.drive).fetch(&entry.id)?;
        sink.event(ProgressEvent {
            message: format!(
                "drive.download rows={} latency_ms={}",
                table.row_count(),
                start.elapsed().as_millis()
            ),
            elapsed: Some(start.elapsed()),
        });
        Ok(table)
    }

    /// Finds a CSV entry by id or by exact name.
    pub fn find_csv(
        &self,
        name_or_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<FolderEntry, SheetsError> {
        self.csv_files(sink)?
            .into_iter()
            .find(|entry| entry.id == name_or_id || entry.name == name_or_id)
            .ok_or_else(|| SheetsError::FileNotFound(name_or_id.to_string()))
    }

    pub fn projects(
        &self,
        file: &str,
        column: Option<&str>,
        save: bool,
        sink: &dyn ProgressSink,
    ) -> Result<ProjectsResult, SheetsError> {
        let entry = self.find_csv(file, sink)?;
        let table = self.load_table(&entry, sink)?;

        let (column, detected) = match (column, projects::resolve_identifier_column(&table)) {
            (Some(column), _) => (column.to_string(), false),
            (None, ColumnResolution::Found(column)) => (column, true),
            (None, ColumnResolution::NotFound) => {
                return Err(column_not_found(
                    crate::columns::IDENTIFIER_COLUMNS,
                    &table,
                ));
            }
        };
        let list = projects::identifiers(&table, &column)?;

        let mut saved = Vec::new();
        if save {
            saved.push(self.save(&projects::passthrough_artifact(&table, &entry.name)?, sink)?);
            saved.push(self.save(&list.artifact()?, sink)?);
        }

        Ok(ProjectsResult {
            columns: table.columns().to_vec(),
            rows: table.row_count(),
            file: entry,
            detected,
            list,
            saved,
        })
    }

    pub fn committees_manual(
        &self,
        numbers: &[String],
        save: bool,
        sink: &dyn ProgressSink,
    ) -> Result<CommitteesResult, SheetsError> {
        let roster = committee::roster_from_numbers(numbers);
        let saved = self.save_roster(&roster, save, sink)?;
        Ok(CommitteesResult {
            file: None,
            roster,
            saved,
        })
    }

    pub fn committees_from_csv(
        &self,
        file: &str,
        column: Option<&str>,
        save: bool,
        sink: &dyn ProgressSink,
    ) -> Result<CommitteesResult, SheetsError> {
        let entry = self.find_csv(file, sink)?;
        let table = self.load_table(&entry, sink)?;

        let roster = match column {
            Some(column) => committee::roster_from_column(&table, column)?,
            None => match committee::extract_committees(&table)? {
                Extraction::Found(roster) => roster,
                Extraction::NotFound => {
                    return Err(column_not_found(
                        crate::columns::COMMITTEE_COLUMNS,
                        &table,
                    ));
                }
            },
        };
        let saved = self.save_roster(&roster, save, sink)?;
        Ok(CommitteesResult {
            file: Some(entry),
            roster,
            saved,
        })
    }

    fn save_roster(
        &self,
        roster: &CommitteeRoster,
        save: bool,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<SavedArtifact>, SheetsError> {
        if !save {
            return Ok(Vec::new());
        }
        Ok(vec![self.save(&roster.artifact()?, sink)?])
    }

    /// One unfiltered listing, then a substring match per number.
    pub fn check_existence(
        &self,
        numbers: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<MatchResult, SheetsError> {
        self.require_folder()?;
        if numbers.is_empty() {
            sink.event(ProgressEvent::new("phase=Check; nothing to check"));
            return Ok(MatchResult::default());
        }
        let entries = self.all_files(sink)?;
        sink.event(ProgressEvent::new(format!(
            "phase=Check; matching {} numbers against {} files",
            numbers.len(),
            entries.len()
        )));
        let result = existence::check_against(numbers, &entries);
        tracing::info!(
            matched = result.matched.len(),
            missing = result.missing.len(),
            "existence check complete"
        );
        Ok(result)
    }

    pub fn check(
        &self,
        numbers: &[String],
        save: bool,
        sink: &dyn ProgressSink,
    ) -> Result<CheckResult, SheetsError> {
        let result = self.check_existence(numbers, sink)?;
        let mut saved = Vec::new();
        if save {
            saved.push(self.save(&result.missing_artifact(), sink)?);
        }
        Ok(CheckResult {
            checked: numbers.len(),
            result,
            saved,
        })
    }

    pub fn save(
        &self,
        artifact: &Artifact,
        sink: &dyn ProgressSink,
    ) -> Result<SavedArtifact, SheetsError> {
        let saved = self.downloads.save(artifact)?;
        sink.event(ProgressEvent::new(format!("phase=Save; wrote {}", saved.path)));
        Ok(saved)
    }
}

fn column_not_found(candidates: &[&str], table: &CsvTable) -> SheetsError {
    SheetsError::ColumnNotFound {
        candidates: candidates.iter().map(|c| c.to_string()).collect(),
        available: table.columns().to_vec(),
    }
}
