use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use project_sheets::app::App;
use project_sheets::committee::RosterSource;
use project_sheets::domain::{FolderEntry, FolderId};
use project_sheets::downloads::Downloads;
use project_sheets::drive::{DriveClient, FileListPage};
use project_sheets::error::SheetsError;
use project_sheets::output::JsonOutput;

/// Serves listings in fixed-size pages and counts every call.
struct MockDrive {
    entries: Vec<FolderEntry>,
    page_size: usize,
    contents: HashMap<String, Vec<u8>>,
    list_calls: Mutex<usize>,
}

impl MockDrive {
    fn new(entries: Vec<FolderEntry>, page_size: usize) -> Self {
        Self {
            entries,
            page_size,
            contents: HashMap::new(),
            list_calls: Mutex::new(0),
        }
    }

    fn with_content(mut self, id: &str, body: &str) -> Self {
        self.contents.insert(id.to_string(), body.as_bytes().to_vec());
        self
    }

    fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

impl DriveClient for MockDrive {
    fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FileListPage, SheetsError> {
        *self.list_calls.lock().unwrap() += 1;
        let matching: Vec<FolderEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                !query.contains("mimeType=") || query.contains(&format!("'{}'", entry.mime_type))
            })
            .cloned()
            .collect();
        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + self.page_size).min(matching.len());
        Ok(FileListPage {
            files: matching[start..end].to_vec(),
            next_page_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>, SheetsError> {
        self.contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| SheetsError::RemoteStatus {
                status: 404,
                message: format!("File not found: {file_id}"),
            })
    }
}

fn entry(id: &str, name: &str, mime: &str, modified: &str) -> FolderEntry {
    FolderEntry {
        id: id.to_string(),
        name: name.to_string(),
        modified_time: modified.to_string(),
        mime_type: mime.to_string(),
    }
}

fn folder_entries() -> Vec<FolderEntry> {
    vec![
        entry("c1", "proiecte_ian.csv", "text/csv", "2024-01-10T08:00:00.000Z"),
        entry("p1", "Proj_101_final.pdf", "application/pdf", "2024-02-01T08:00:00.000Z"),
        entry("c2", "comisii.csv", "text/csv", "2024-03-05T08:00:00.000Z"),
        entry("p2", "other_102.pdf", "application/pdf", "2024-01-01T08:00:00.000Z"),
        entry("c3", "fara_coloane.csv", "text/csv", "2023-12-01T08:00:00.000Z"),
    ]
}

fn app_with(drive: MockDrive) -> (App<MockDrive>, tempfile::TempDir) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let app = App::new(
        drive,
        Some("folder_1".parse::<FolderId>().unwrap()),
        Downloads::new_with_path(root),
    );
    (app, temp)
}

fn standard_drive() -> MockDrive {
    MockDrive::new(folder_entries(), 2)
        .with_content("c1", "Numar,Titlu\n101,Drumuri\n102,Scoli\n,Fara numar\n")
        .with_content("c2", "Nr,Comisii raport,Titlu\n1,Juridica,a\n2,Buget,b\n")
        .with_content("c3", "A,B\nx,y\n")
}

#[test]
fn csv_listing_unions_pages_newest_first() {
    let (app, _temp) = app_with(standard_drive());
    let files = app.csv_files(&JsonOutput).unwrap();

    let names: Vec<&str> = files.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["comisii.csv", "proiecte_ian.csv", "fara_coloane.csv"]);
    // three CSV entries with a page size of two
    assert_eq!(app.drive().list_calls(), 2);
}

#[test]
fn listing_twice_is_stable() {
    let (app, _temp) = app_with(standard_drive());
    let first = app.files(true, &JsonOutput).unwrap();
    let second = app.files(true, &JsonOutput).unwrap();
    assert_eq!(first.files, second.files);
    assert_eq!(first.files.len(), 5);
    assert_eq!(first.folder_id, "folder_1");
}

#[test]
fn projects_detects_identifier_column_and_saves() {
    let (app, temp) = app_with(standard_drive());
    let result = app
        .projects("proiecte_ian.csv", None, true, &JsonOutput)
        .unwrap();

    assert!(result.detected);
    assert_eq!(result.list.column, "Numar");
    assert_eq!(result.list.identifiers, vec!["101", "102", "nan"]);
    assert_eq!(result.rows, 3);
    assert_eq!(result.saved.len(), 2);

    let list = fs::read_to_string(temp.path().join("lista_proiecte.csv")).unwrap();
    assert_eq!(list, "Numar\n101\n102\nnan\n");
    assert!(temp.path().join("proiecte_ian.csv").exists());
}

#[test]
fn projects_without_known_column_lists_available_columns() {
    let (app, _temp) = app_with(standard_drive());
    let err = app
        .projects("fara_coloane.csv", None, false, &JsonOutput)
        .unwrap_err();
    assert_matches!(
        err,
        SheetsError::ColumnNotFound { ref available, .. } if available == &["A", "B"]
    );

    let chosen = app
        .projects("c3", Some("B"), false, &JsonOutput)
        .unwrap();
    assert!(!chosen.detected);
    assert_eq!(chosen.list.identifiers, vec!["y"]);
}

#[test]
fn unknown_file_is_reported() {
    let (app, _temp) = app_with(standard_drive());
    assert_matches!(
        app.projects("missing.csv", None, false, &JsonOutput),
        Err(SheetsError::FileNotFound(name)) if name == "missing.csv"
    );
}

#[test]
fn committees_from_csv_pairs_first_column() {
    let (app, temp) = app_with(standard_drive());
    let result = app
        .committees_from_csv("comisii.csv", None, true, &JsonOutput)
        .unwrap();

    assert_eq!(result.roster.source, RosterSource::Detected);
    assert_eq!(result.roster.table.columns(), ["Comisii raport", "Numar"]);
    let saved = fs::read_to_string(temp.path().join("comisii_raport.csv")).unwrap();
    assert_eq!(saved, "Comisii raport,Numar\nJuridica,1\nBuget,2\n");
}

#[test]
fn committees_manual_has_blank_committees() {
    let (app, temp) = app_with(standard_drive());
    let numbers = vec!["101".to_string(), "102".to_string()];
    let result = app.committees_manual(&numbers, true, &JsonOutput).unwrap();

    assert!(result.file.is_none());
    assert_eq!(app.drive().list_calls(), 0);
    let saved = fs::read_to_string(temp.path().join("comisii_raport_manual.csv")).unwrap();
    assert_eq!(saved, "Numar,Comisii raport\n101,\n102,\n");
}

#[test]
fn check_splits_matched_and_missing() {
    let (app, temp) = app_with(standard_drive());
    let numbers = vec!["101".to_string(), "102".to_string(), "103".to_string()];
    let result = app.check(&numbers, true, &JsonOutput).unwrap();

    assert_eq!(result.checked, 3);
    assert_eq!(result.result.matched.len(), 2);
    assert_eq!(result.result.matched[0].files, vec!["Proj_101_final.pdf"]);
    assert_eq!(result.result.matched[1].files, vec!["other_102.pdf"]);
    assert_eq!(result.result.missing, vec!["103"]);

    let missing = fs::read_to_string(temp.path().join("proiecte_fara_fisa.txt")).unwrap();
    assert_eq!(missing, "103");
}

#[test]
fn empty_check_makes_no_remote_call() {
    let (app, _temp) = app_with(standard_drive());
    let result = app.check_existence(&[], &JsonOutput).unwrap();
    assert!(result.matched.is_empty());
    assert!(result.missing.is_empty());
    assert_eq!(app.drive().list_calls(), 0);
}

#[test]
fn unset_folder_fails_without_querying() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let app = App::new(standard_drive(), None, Downloads::new_with_path(root));

    assert_matches!(app.csv_files(&JsonOutput), Err(SheetsError::MissingFolderId));
    assert_matches!(
        app.check_existence(&[], &JsonOutput),
        Err(SheetsError::MissingFolderId)
    );
    assert_eq!(app.drive().list_calls(), 0);
}

#[test]
fn invalid_folder_is_reported_by_every_operation() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let app = App::new(standard_drive(), None, Downloads::new_with_path(root))
        .with_folder_problem(Some("abc' or 'x".to_string()));

    assert_matches!(
        app.csv_files(&JsonOutput),
        Err(SheetsError::InvalidFolderId(raw)) if raw == "abc' or 'x"
    );
    assert_matches!(app.files(true, &JsonOutput), Err(SheetsError::InvalidFolderId(_)));
    assert_matches!(
        app.check_existence(&[], &JsonOutput),
        Err(SheetsError::InvalidFolderId(_))
    );
    assert_matches!(
        app.check(&["101".to_string()], false, &JsonOutput),
        Err(SheetsError::InvalidFolderId(_))
    );
    assert_eq!(app.drive().list_calls(), 0);
}

#[test]
fn download_failure_surfaces_remote_status() {
    let drive = MockDrive::new(
        vec![entry("gone", "gone.csv", "text/csv", "2024-01-01T00:00:00Z")],
        10,
    );
    let (app, _temp) = app_with(drive);
    assert_matches!(
        app.projects("gone.csv", None, false, &JsonOutput),
        Err(SheetsError::RemoteStatus { status: 404, .. })
    );
}
