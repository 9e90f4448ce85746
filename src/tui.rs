use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant, SystemTime};

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap};

use crate::app::{App, ProgressEvent, ProgressSink};
use crate::committee::{self, CommitteeRoster, Extraction};
use crate::domain::{ColumnResolution, FolderEntry, parse_number_list};
use crate::drive::DriveClient;
use crate::error::SheetsError;
use crate::existence::MatchResult;
use crate::output::empty_listing_message;
use crate::projects::{self, ProjectList};
use crate::table::CsvTable;

const LOGS_MAX: usize = 200;
const TABLE_PAGE: usize = 10;
const HINTS: &[&str] = &[
    "Tip: Esc returns to the menu, Esc in the menu quits",
    "Tip: Ctrl+R reloads or runs the section action",
    "Tip: Ctrl+S saves the current result to the downloads folder",
    "Tip: F1 help, F4 logs",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Dashboard,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Menu,
    Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Projects,
    Committees,
    Check,
}

impl Section {
    const ALL: [Section; 3] = [Section::Projects, Section::Committees, Section::Check];

    pub fn label(self) -> &'static str {
        match self {
            Section::Projects => "1. Generare listă proiecte (citire CSV)",
            Section::Committees => "2. Comisii de raport (din CSV)",
            Section::Check => "3. Verificare fișe Google Drive",
        }
    }

    fn index(self) -> usize {
        match self {
            Section::Projects => 0,
            Section::Committees => 1,
            Section::Check => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitteeMode {
    Manual,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Status {
    kind: StatusKind,
    text: String,
}

/// Cursor over a list of labels.
#[derive(Debug, Clone)]
struct Picker {
    items: Vec<String>,
    selected: usize,
}

impl Picker {
    fn new(items: Vec<String>) -> Self {
        Self { items, selected: 0 }
    }

    fn step(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    fn current(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct LoadedCsv {
    entry: FolderEntry,
    table: CsvTable,
    scroll: usize,
}

impl LoadedCsv {
    fn scroll_by(&mut self, delta: isize) {
        let last = self.table.row_count().saturating_sub(1) as isize;
        self.scroll = (self.scroll as isize + delta).clamp(0, last.max(0)) as usize;
    }
}

/// CSV entries of the folder plus the one currently opened, if any.
#[derive(Debug, Clone)]
struct CsvBrowser {
    files: Vec<FolderEntry>,
    picker: Picker,
    loaded: Option<LoadedCsv>,
}

impl CsvBrowser {
    fn new(files: Vec<FolderEntry>) -> Self {
        let picker = Picker::new(files.iter().map(FolderEntry::label).collect());
        Self {
            files,
            picker,
            loaded: None,
        }
    }

    fn selected_entry(&self) -> Option<&FolderEntry> {
        self.files.get(self.picker.selected)
    }
}

#[derive(Debug, Default)]
struct ProjectsState {
    browser: Option<CsvBrowser>,
    column_picker: Option<Picker>,
    list: Option<ProjectList>,
    list_scroll: u16,
}

#[derive(Debug)]
struct CommitteesState {
    mode: CommitteeMode,
    manual: String,
    browser: Option<CsvBrowser>,
    column_picker: Option<Picker>,
    roster: Option<CommitteeRoster>,
    roster_scroll: u16,
}

#[derive(Debug, Default)]
struct CheckState {
    input: String,
    result: Option<MatchResult>,
    results_scroll: u16,
}

impl CheckState {
    /// Rendered lines of the result panel: both headings, the blank separator, one per number.
    fn result_lines(&self) -> usize {
        self.result
            .as_ref()
            .map(|result| result.matched.len() + result.missing.len() + 3)
            .unwrap_or(1)
    }
}

/// Progress events land here and feed the log view.
#[derive(Debug, Default)]
struct EventLog {
    entries: RefCell<VecDeque<String>>,
}

impl EventLog {
    fn push(&self, message: String) {
        let mut entries = self.entries.borrow_mut();
        entries.push_back(format!("[{}] {message}", timestamp()));
        while entries.len() > LOGS_MAX {
            entries.pop_front();
        }
    }

    fn lines(&self) -> Vec<String> {
        self.entries.borrow().iter().cloned().collect()
    }
}

impl ProgressSink for EventLog {
    fn event(&self, event: ProgressEvent) {
        self.push(event.message.trim().to_string());
    }
}

/// Screen state and key handling, independent of the terminal.
pub struct Dashboard<'a, C: DriveClient> {
    app: &'a App<C>,
    folder_summary: String,
    view: View,
    focus: Focus,
    section: Section,
    projects: ProjectsState,
    committees: CommitteesState,
    check: CheckState,
    status: Option<Status>,
    log: EventLog,
    log_scroll: u16,
    hint_index: usize,
    last_hint_update: Instant,
}

impl<'a, C: DriveClient> Dashboard<'a, C> {
    pub fn new(app: &'a App<C>, folder_summary: String) -> Self {
        Self {
            app,
            folder_summary,
            view: View::Dashboard,
            focus: Focus::Menu,
            section: Section::Projects,
            projects: ProjectsState::default(),
            committees: CommitteesState {
                mode: CommitteeMode::Manual,
                manual: String::new(),
                browser: None,
                column_picker: None,
                roster: None,
                roster_scroll: 0,
            },
            check: CheckState::default(),
            status: None,
            log: EventLog::default(),
            log_scroll: 0,
            hint_index: 0,
            last_hint_update: Instant::now(),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            return true;
        }
        match key.code {
            KeyCode::F(1) => {
                self.view = View::Help;
                return false;
            }
            KeyCode::F(4) => {
                self.view = View::Logs;
                return false;
            }
            KeyCode::Esc => {
                if self.view != View::Dashboard {
                    self.view = View::Dashboard;
                    return false;
                }
                if self.focus == Focus::Section {
                    self.focus = Focus::Menu;
                    return false;
                }
                return true;
            }
            _ => {}
        }

        match self.view {
            View::Logs => {
                match key.code {
                    KeyCode::PageUp | KeyCode::Up => self.scroll_logs(5),
                    KeyCode::PageDown | KeyCode::Down => self.scroll_logs(-5),
                    _ => {}
                }
                false
            }
            View::Help => false,
            View::Dashboard => {
                match self.focus {
                    Focus::Menu => self.menu_key(key.code),
                    Focus::Section => self.section_key(key.code, ctrl),
                }
                false
            }
        }
    }

    fn menu_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.select_section(self.section.index().saturating_sub(1)),
            KeyCode::Down => self.select_section((self.section.index() + 1).min(2)),
            KeyCode::Char(ch @ '1'..='3') => {
                self.select_section(ch as usize - '1' as usize);
                self.enter_section();
            }
            KeyCode::Enter | KeyCode::Right | KeyCode::Tab => self.enter_section(),
            _ => {}
        }
    }

    fn select_section(&mut self, index: usize) {
        self.section = Section::ALL[index];
    }

    fn enter_section(&mut self) {
        self.focus = Focus::Section;
        match self.section {
            Section::Projects if self.projects.browser.is_none() => self.refresh_projects(),
            Section::Committees
                if self.committees.mode == CommitteeMode::Csv
                    && self.committees.browser.is_none() =>
            {
                self.refresh_committee_files()
            }
            _ => {}
        }
    }

    fn section_key(&mut self, code: KeyCode, ctrl: bool) {
        match self.section {
            Section::Projects => self.projects_key(code, ctrl),
            Section::Committees => self.committees_key(code, ctrl),
            Section::Check => self.check_key(code, ctrl),
        }
    }

    // ---- section 1: project list ----

    fn projects_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('r') if ctrl => self.refresh_projects(),
            KeyCode::Char('s') if ctrl => self.save_projects_csv(),
            KeyCode::Char('d') if ctrl => self.save_identifier_list(),
            KeyCode::Up if ctrl => self.scroll_identifiers(-1),
            KeyCode::Down if ctrl => self.scroll_identifiers(1),
            KeyCode::PageUp if ctrl => self.scroll_identifiers(-(TABLE_PAGE as isize)),
            KeyCode::PageDown if ctrl => self.scroll_identifiers(TABLE_PAGE as isize),
            KeyCode::Up => self.projects_step(-1),
            KeyCode::Down => self.projects_step(1),
            KeyCode::PageUp => scroll_loaded(&mut self.projects.browser, -(TABLE_PAGE as isize)),
            KeyCode::PageDown => scroll_loaded(&mut self.projects.browser, TABLE_PAGE as isize),
            KeyCode::Enter => self.projects_enter(),
            KeyCode::Backspace | KeyCode::Left => {
                if let Some(browser) = self.projects.browser.as_mut() {
                    browser.loaded = None;
                }
                self.projects.column_picker = None;
                self.projects.list = None;
                self.projects.list_scroll = 0;
            }
            _ => {}
        }
    }

    fn projects_step(&mut self, delta: isize) {
        let Some(browser) = self.projects.browser.as_mut() else {
            return;
        };
        match (browser.loaded.as_mut(), self.projects.column_picker.as_mut()) {
            (Some(_), Some(picker)) => picker.step(delta),
            (Some(loaded), None) => loaded.scroll_by(delta),
            (None, _) => browser.picker.step(delta),
        }
    }

    fn scroll_identifiers(&mut self, delta: isize) {
        let lines = self
            .projects
            .list
            .as_ref()
            .map_or(0, |list| list.identifiers.len());
        self.projects.list_scroll = scroll_offset(self.projects.list_scroll, delta, lines);
    }

    fn refresh_projects(&mut self) {
        let result = self.app.csv_files(&self.log);
        match result {
            Ok(files) => {
                self.announce_listing(&files);
                self.projects = ProjectsState {
                    browser: Some(CsvBrowser::new(files)),
                    ..ProjectsState::default()
                };
            }
            Err(err) => self.fail(err),
        }
    }

    fn projects_enter(&mut self) {
        let Some(browser) = self.projects.browser.as_ref() else {
            self.refresh_projects();
            return;
        };

        if let Some(loaded) = browser.loaded.as_ref() {
            let Some(picker) = self.projects.column_picker.as_ref() else {
                return;
            };
            let Some(column) = picker.current().map(str::to_string) else {
                return;
            };
            match projects::identifiers(&loaded.table, &column) {
                Ok(list) => {
                    self.set_status(StatusKind::Success, format!("Coloana selectată: {column}"));
                    self.projects.list = Some(list);
                    self.projects.list_scroll = 0;
                }
                Err(err) => self.fail(err),
            }
            return;
        }

        let Some(entry) = browser.selected_entry().cloned() else {
            return;
        };
        let table = match self.app.load_table(&entry, &self.log) {
            Ok(table) => table,
            Err(err) => {
                self.fail(err);
                return;
            }
        };

        self.projects.list = None;
        self.projects.column_picker = None;
        match projects::resolve_identifier_column(&table) {
            ColumnResolution::Found(column) => match projects::identifiers(&table, &column) {
                Ok(list) => {
                    self.set_status(
                        StatusKind::Success,
                        format!("Fișier: {} — coloana {column}", entry.name),
                    );
                    self.projects.list = Some(list);
                    self.projects.list_scroll = 0;
                }
                Err(err) => self.fail(err),
            },
            ColumnResolution::NotFound => {
                self.set_status(
                    StatusKind::Warning,
                    "Coloana cu numărul proiectului nu a fost găsită automat. Selectează manual coloana.",
                );
                self.projects.column_picker = Some(Picker::new(table.columns().to_vec()));
            }
        }
        if let Some(browser) = self.projects.browser.as_mut() {
            browser.loaded = Some(LoadedCsv {
                entry,
                table,
                scroll: 0,
            });
        }
    }

    fn save_projects_csv(&mut self) {
        let Some(loaded) = self
            .projects
            .browser
            .as_ref()
            .and_then(|browser| browser.loaded.as_ref())
        else {
            self.set_status(StatusKind::Info, "Open a CSV file first");
            return;
        };
        let saved = projects::passthrough_artifact(&loaded.table, &loaded.entry.name)
            .and_then(|artifact| self.app.save(&artifact, &self.log));
        self.report_saved(saved);
    }

    fn save_identifier_list(&mut self) {
        let Some(list) = self.projects.list.as_ref() else {
            self.set_status(StatusKind::Info, "No identifier list yet");
            return;
        };
        let saved = list
            .artifact()
            .and_then(|artifact| self.app.save(&artifact, &self.log));
        self.report_saved(saved);
    }

    // ---- section 2: committee roster ----

    fn committees_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('t') if ctrl => self.toggle_committee_mode(),
            KeyCode::Char('r') if ctrl => self.run_committees(),
            KeyCode::Char('s') if ctrl => self.save_roster(),
            KeyCode::Up if ctrl => self.scroll_roster(-1),
            KeyCode::Down if ctrl => self.scroll_roster(1),
            KeyCode::PageUp if ctrl => self.scroll_roster(-(TABLE_PAGE as isize)),
            KeyCode::PageDown if ctrl => self.scroll_roster(TABLE_PAGE as isize),
            _ => match self.committees.mode {
                CommitteeMode::Manual => match code {
                    KeyCode::PageUp => self.scroll_roster(-(TABLE_PAGE as isize)),
                    KeyCode::PageDown => self.scroll_roster(TABLE_PAGE as isize),
                    _ if !ctrl => edit_text(&mut self.committees.manual, code),
                    _ => {}
                },
                CommitteeMode::Csv => self.committee_csv_key(code),
            },
        }
    }

    fn committee_csv_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.committee_step(-1),
            KeyCode::Down => self.committee_step(1),
            KeyCode::PageUp => {
                scroll_loaded(&mut self.committees.browser, -(TABLE_PAGE as isize))
            }
            KeyCode::PageDown => scroll_loaded(&mut self.committees.browser, TABLE_PAGE as isize),
            KeyCode::Enter => self.committee_enter(),
            KeyCode::Backspace | KeyCode::Left => {
                if let Some(browser) = self.committees.browser.as_mut() {
                    browser.loaded = None;
                }
                self.committees.column_picker = None;
                self.set_roster(None);
            }
            _ => {}
        }
    }

    fn committee_step(&mut self, delta: isize) {
        let Some(browser) = self.committees.browser.as_mut() else {
            return;
        };
        match (browser.loaded.as_mut(), self.committees.column_picker.as_mut()) {
            (Some(_), Some(picker)) => picker.step(delta),
            (Some(loaded), None) => loaded.scroll_by(delta),
            (None, _) => browser.picker.step(delta),
        }
    }

    fn scroll_roster(&mut self, delta: isize) {
        let lines = self
            .committees
            .roster
            .as_ref()
            .map_or(0, |roster| roster.table.row_count() + 1);
        self.committees.roster_scroll = scroll_offset(self.committees.roster_scroll, delta, lines);
    }

    fn set_roster(&mut self, roster: Option<CommitteeRoster>) {
        self.committees.roster = roster;
        self.committees.roster_scroll = 0;
    }

    fn toggle_committee_mode(&mut self) {
        self.set_roster(None);
        self.committees.column_picker = None;
        self.committees.mode = match self.committees.mode {
            CommitteeMode::Manual => CommitteeMode::Csv,
            CommitteeMode::Csv => CommitteeMode::Manual,
        };
        if self.committees.mode == CommitteeMode::Csv && self.committees.browser.is_none() {
            self.refresh_committee_files();
        }
    }

    fn refresh_committee_files(&mut self) {
        let result = self.app.csv_files(&self.log);
        match result {
            Ok(files) => {
                self.announce_listing(&files);
                self.committees.browser = Some(CsvBrowser::new(files));
                self.committees.column_picker = None;
                self.set_roster(None);
            }
            Err(err) => self.fail(err),
        }
    }

    fn committee_enter(&mut self) {
        let Some(browser) = self.committees.browser.as_ref() else {
            self.refresh_committee_files();
            return;
        };

        if let Some(loaded) = browser.loaded.as_ref() {
            let Some(column) = self
                .committees
                .column_picker
                .as_ref()
                .and_then(|picker| picker.current().map(str::to_string))
            else {
                return;
            };
            match committee::roster_from_column(&loaded.table, &column) {
                Ok(roster) => {
                    self.set_status(StatusKind::Success, format!("Coloana selectată: {column}"));
                    self.set_roster(Some(roster));
                }
                Err(err) => self.fail(err),
            }
            return;
        }

        let Some(entry) = browser.selected_entry().cloned() else {
            return;
        };
        match self.app.load_table(&entry, &self.log) {
            Ok(table) => {
                self.set_status(
                    StatusKind::Info,
                    format!("{} încărcat; Ctrl+R extrage comisiile de raport", entry.name),
                );
                self.set_roster(None);
                self.committees.column_picker = None;
                if let Some(browser) = self.committees.browser.as_mut() {
                    browser.loaded = Some(LoadedCsv {
                        entry,
                        table,
                        scroll: 0,
                    });
                }
            }
            Err(err) => self.fail(err),
        }
    }

    fn run_committees(&mut self) {
        match self.committees.mode {
            CommitteeMode::Manual => {
                let numbers = parse_number_list(&self.committees.manual);
                if numbers.is_empty() {
                    self.set_status(StatusKind::Info, "Introdu numere de proiect (unul per linie)");
                    return;
                }
                self.set_status(
                    StatusKind::Success,
                    format!("{} numere de proiect preluate", numbers.len()),
                );
                self.set_roster(Some(committee::roster_from_numbers(&numbers)));
            }
            CommitteeMode::Csv => {
                let Some(loaded) = self
                    .committees
                    .browser
                    .as_ref()
                    .and_then(|browser| browser.loaded.as_ref())
                else {
                    self.set_status(StatusKind::Info, "Open a CSV file first");
                    return;
                };
                match committee::extract_committees(&loaded.table) {
                    Ok(Extraction::Found(roster)) => {
                        let column = roster.table.columns()[0].clone();
                        self.set_status(StatusKind::Success, format!("Found column: {column}"));
                        self.committees.column_picker = None;
                        self.set_roster(Some(roster));
                    }
                    Ok(Extraction::NotFound) => {
                        let columns = loaded.table.columns().to_vec();
                        self.set_status(
                            StatusKind::Warning,
                            "Nu am găsit o coloană care să conțină comisiile. Selectează manual coloana.",
                        );
                        self.set_roster(None);
                        self.committees.column_picker = Some(Picker::new(columns));
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    fn save_roster(&mut self) {
        let Some(roster) = self.committees.roster.as_ref() else {
            self.set_status(StatusKind::Info, "No roster yet; Ctrl+R builds it");
            return;
        };
        let saved = roster
            .artifact()
            .and_then(|artifact| self.app.save(&artifact, &self.log));
        self.report_saved(saved);
    }

    // ---- section 3: existence check ----

    fn check_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('r') if ctrl => self.run_check(),
            KeyCode::Char('s') if ctrl => self.save_missing(),
            KeyCode::Up => self.scroll_results(-1),
            KeyCode::Down => self.scroll_results(1),
            KeyCode::PageUp => self.scroll_results(-(TABLE_PAGE as isize)),
            KeyCode::PageDown => self.scroll_results(TABLE_PAGE as isize),
            _ if !ctrl => edit_text(&mut self.check.input, code),
            _ => {}
        }
    }

    fn run_check(&mut self) {
        let numbers = parse_number_list(&self.check.input);
        let result = self.app.check_existence(&numbers, &self.log);
        match result {
            Ok(result) => {
                self.set_status(
                    StatusKind::Success,
                    format!(
                        "{} cu fișă, {} fără fișă",
                        result.matched.len(),
                        result.missing.len()
                    ),
                );
                self.check.result = Some(result);
                self.check.results_scroll = 0;
            }
            Err(err) => self.fail(err),
        }
    }

    fn scroll_results(&mut self, delta: isize) {
        let lines = self.check.result_lines();
        self.check.results_scroll = scroll_offset(self.check.results_scroll, delta, lines);
    }

    fn save_missing(&mut self) {
        let Some(result) = self.check.result.as_ref() else {
            self.set_status(StatusKind::Info, "Run the check first (Ctrl+R)");
            return;
        };
        let saved = self.app.save(&result.missing_artifact(), &self.log);
        self.report_saved(saved);
    }

    // ---- shared helpers ----

    fn announce_listing(&mut self, files: &[FolderEntry]) {
        if files.is_empty() {
            self.set_status(StatusKind::Info, empty_listing_message(false));
        } else {
            self.set_status(StatusKind::Info, format!("{} fișiere CSV", files.len()));
        }
    }

    fn report_saved(&mut self, saved: Result<crate::downloads::SavedArtifact, SheetsError>) {
        match saved {
            Ok(saved) => self.set_status(StatusKind::Success, format!("Salvat: {}", saved.path)),
            Err(err) => self.fail(err),
        }
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        self.log.push(text.clone());
        self.status = Some(Status { kind, text });
    }

    fn fail(&mut self, err: SheetsError) {
        tracing::warn!(error = %err, "dashboard action failed");
        self.set_status(StatusKind::Error, err.to_string());
    }

    fn scroll_logs(&mut self, delta: i16) {
        let max = self.log.entries.borrow().len();
        let max_scroll = max.saturating_sub(1) as i16;
        let next = (self.log_scroll as i16 + delta).clamp(0, max_scroll);
        self.log_scroll = next as u16;
    }

    fn refresh_hint(&mut self) {
        if self.last_hint_update.elapsed() >= Duration::from_secs(5) {
            self.hint_index = (self.hint_index + 1) % HINTS.len().max(1);
            self.last_hint_update = Instant::now();
        }
    }
}

fn scroll_loaded(browser: &mut Option<CsvBrowser>, delta: isize) {
    if let Some(loaded) = browser.as_mut().and_then(|browser| browser.loaded.as_mut()) {
        loaded.scroll_by(delta);
    }
}

/// Moves a paragraph offset, keeping at least its last line on screen.
fn scroll_offset(current: u16, delta: isize, lines: usize) -> u16 {
    let last = lines.saturating_sub(1).min(u16::MAX as usize) as isize;
    (current as isize + delta).clamp(0, last) as u16
}

fn edit_text(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(ch) => buffer.push(ch),
        KeyCode::Enter => buffer.push('\n'),
        KeyCode::Backspace => {
            buffer.pop();
        }
        _ => {}
    }
}

pub struct Tui;

impl Tui {
    /// Runs the dashboard until the user quits, restoring the terminal on exit.
    pub fn run_dashboard<C: DriveClient>(
        app: &App<C>,
        folder_summary: String,
    ) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let result = Terminal::new(backend)
            .into_diagnostic()
            .and_then(|mut terminal| {
                terminal.clear().into_diagnostic()?;
                let mut dashboard = Dashboard::new(app, folder_summary);
                event_loop(&mut terminal, &mut dashboard)
            });

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }
}

fn event_loop<C: DriveClient>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut Dashboard<'_, C>,
) -> miette::Result<()> {
    let mut tick = 0usize;
    loop {
        dashboard.refresh_hint();
        let current: &Dashboard<'_, C> = dashboard;
        terminal
            .draw(|frame| draw_ui(frame, current, tick))
            .into_diagnostic()?;

        if event::poll(Duration::from_millis(120)).into_diagnostic()? {
            if let Event::Key(key) = event::read().into_diagnostic()? {
                if dashboard.handle_key(key) {
                    return Ok(());
                }
            }
        }
        tick = tick.wrapping_add(1);
    }
}

fn draw_ui<C: DriveClient>(frame: &mut ratatui::Frame, dashboard: &Dashboard<'_, C>, tick: usize) {
    match dashboard.view {
        View::Dashboard => draw_dashboard(frame, dashboard, tick),
        View::Logs => draw_logs(frame, dashboard, tick),
        View::Help => draw_help(frame),
    }
}

fn draw_dashboard<C: DriveClient>(
    frame: &mut ratatui::Frame,
    dashboard: &Dashboard<'_, C>,
    tick: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(dashboard, tick), chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(chunks[1]);

    draw_sidebar(frame, dashboard, body[0]);
    match dashboard.section {
        Section::Projects => draw_projects(frame, dashboard, body[1]),
        Section::Committees => draw_committees(frame, dashboard, body[1]),
        Section::Check => draw_check(frame, dashboard, body[1]),
    }

    frame.render_widget(draw_status_line(dashboard), chunks[2]);
}

fn draw_header<C: DriveClient>(dashboard: &Dashboard<'_, C>, tick: usize) -> Paragraph<'static> {
    let hb = if tick % 2 == 0 { "*" } else { " " };
    let header_line = Line::from(vec![
        Span::styled(
            "FIȘE PROIECTE",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(Color::Gray)),
        Span::raw("   Section: "),
        Span::styled(
            dashboard.section.label(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   "),
        Span::styled(hb, Style::default().fg(Color::Green)),
    ]);
    let downloads_line = Line::from(Span::styled(
        format!("Downloads: {}", dashboard.app.downloads().root()),
        Style::default().fg(Color::Gray),
    ));
    Paragraph::new(vec![header_line, downloads_line])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::BOTTOM))
}

fn draw_sidebar<C: DriveClient>(frame: &mut ratatui::Frame, dashboard: &Dashboard<'_, C>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let menu_color = if dashboard.focus == Focus::Menu {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let items = Section::ALL
        .iter()
        .map(|section| ListItem::new(section.label()))
        .collect::<Vec<_>>();
    let menu = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Funcționalitate")
                .border_style(Style::default().fg(menu_color)),
        )
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(dashboard.section.index()));
    frame.render_stateful_widget(menu, chunks[0], &mut state);

    let folder_style = if dashboard.folder_summary.starts_with('!') {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };
    let folder = Paragraph::new(vec![
        Line::from("Date din folder Drive:"),
        Line::from(Span::styled(dashboard.folder_summary.clone(), folder_style)),
        Line::from(""),
        Line::from(Span::styled(
            HINTS[dashboard.hint_index],
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::RIGHT));
    frame.render_widget(folder, chunks[1]);
}

fn draw_projects<C: DriveClient>(frame: &mut ratatui::Frame, dashboard: &Dashboard<'_, C>, area: Rect) {
    let state = &dashboard.projects;
    let title = "Generare / Vizualizare listă proiecte";
    let Some(browser) = state.browser.as_ref() else {
        frame.render_widget(placeholder(title, "Ctrl+R listează fișierele CSV din folder."), area);
        return;
    };
    let Some(loaded) = browser.loaded.as_ref() else {
        draw_file_picker(frame, browser, title, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(4)])
        .split(area);
    frame.render_widget(file_caption(&loaded.entry), chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);
    draw_table(frame, &loaded.table, loaded.scroll, "Tabel", main[0]);

    let identifiers = state
        .list
        .as_ref()
        .map(|list| list.identifiers.clone())
        .unwrap_or_default();
    let list_title = match state.list.as_ref() {
        Some(list) => format!("Listă simplificată ({})", list.column),
        None => "Listă simplificată (numere identificare)".to_string(),
    };
    draw_side_list(
        frame,
        state.column_picker.as_ref(),
        "Selectează coloana de identificare",
        &list_title,
        identifiers.into_iter().map(Line::from).collect(),
        state.list_scroll,
        main[1],
    );
}

fn draw_committees<C: DriveClient>(
    frame: &mut ratatui::Frame,
    dashboard: &Dashboard<'_, C>,
    area: Rect,
) {
    let state = &dashboard.committees;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(4)])
        .split(area);

    let (manual_style, csv_style) = match state.mode {
        CommitteeMode::Manual => (selected_style(), Style::default().fg(Color::Gray)),
        CommitteeMode::Csv => (Style::default().fg(Color::Gray), selected_style()),
    };
    let mode_line = Paragraph::new(Line::from(vec![
        Span::styled("Sursă: ", Style::default().fg(Color::Gray)),
        Span::styled("[Introdu manual]", manual_style),
        Span::raw(" "),
        Span::styled("[Alege CSV din Drive]", csv_style),
        Span::styled("   Ctrl+T schimbă sursa", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(mode_line, chunks[0]);

    let roster_lines = state
        .roster
        .as_ref()
        .map(roster_lines)
        .unwrap_or_default();
    let roster_title = state
        .roster
        .as_ref()
        .map(|roster| format!("Comisii de raport → {}", roster.file_name()))
        .unwrap_or_else(|| "Comisii de raport".to_string());

    match state.mode {
        CommitteeMode::Manual => {
            let main = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);
            let count = parse_number_list(&state.manual).len();
            draw_text_area(
                frame,
                &state.manual,
                &format!("Numere de proiect (unul per linie) · {count}"),
                dashboard.focus == Focus::Section,
                main[0],
            );
            frame.render_widget(
                Paragraph::new(roster_lines)
                    .scroll((state.roster_scroll, 0))
                    .block(Block::default().borders(Borders::ALL).title(roster_title)),
                main[1],
            );
        }
        CommitteeMode::Csv => {
            let title = "Alege CSV";
            let Some(browser) = state.browser.as_ref() else {
                frame.render_widget(placeholder(title, "Ctrl+R listează fișierele CSV."), chunks[1]);
                return;
            };
            let Some(loaded) = browser.loaded.as_ref() else {
                draw_file_picker(frame, browser, title, chunks[1]);
                return;
            };
            let main = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);
            draw_table(frame, &loaded.table, loaded.scroll, &loaded.entry.name, main[0]);
            draw_side_list(
                frame,
                state.column_picker.as_ref(),
                "Selectează coloana cu comisii",
                &roster_title,
                roster_lines,
                state.roster_scroll,
                main[1],
            );
        }
    }
}

fn draw_check<C: DriveClient>(frame: &mut ratatui::Frame, dashboard: &Dashboard<'_, C>, area: Rect) {
    let state = &dashboard.check;
    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let count = parse_number_list(&state.input).len();
    draw_text_area(
        frame,
        &state.input,
        &format!("Numere de proiect (unul per linie) · {count}"),
        dashboard.focus == Focus::Section,
        main[0],
    );

    let mut lines = Vec::new();
    if let Some(result) = state.result.as_ref() {
        lines.push(Line::from(Span::styled(
            "Proiecte cu fișă (match în nume fișier)",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        for item in &result.matched {
            lines.push(Line::from(format!("- {} → {}", item.number, item.files.join(", "))));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Proiecte fără fișă",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        for number in &result.missing {
            lines.push(Line::from(format!("- {number}")));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Ctrl+R verifică fișele din folder.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let results = Paragraph::new(lines)
        .scroll((state.results_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Rezultat"));
    frame.render_widget(results, main[1]);
}

fn draw_file_picker(frame: &mut ratatui::Frame, browser: &CsvBrowser, title: &str, area: Rect) {
    if browser.files.is_empty() {
        frame.render_widget(
            placeholder(title, empty_listing_message(false)),
            area,
        );
        return;
    }
    let items = browser
        .picker
        .items
        .iter()
        .map(|label| ListItem::new(label.clone()))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .highlight_style(selected_style())
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(browser.picker.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_side_list(
    frame: &mut ratatui::Frame,
    picker: Option<&Picker>,
    picker_title: &str,
    title: &str,
    lines: Vec<Line<'static>>,
    scroll: u16,
    area: Rect,
) {
    let content_area = if let Some(picker) = picker {
        let height = (picker.items.len() as u16 + 2).min(area.height / 2).max(3);
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(height), Constraint::Min(3)])
            .split(area);
        let items = picker
            .items
            .iter()
            .map(|item| ListItem::new(item.clone()))
            .collect::<Vec<_>>();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(picker_title.to_string())
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .highlight_style(selected_style())
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(picker.selected));
        frame.render_stateful_widget(list, parts[0], &mut state);
        parts[1]
    } else {
        area
    };

    let paragraph = Paragraph::new(lines)
        .scroll((scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, content_area);
}

fn draw_table(frame: &mut ratatui::Frame, table: &CsvTable, scroll: usize, title: &str, area: Rect) {
    let header = Row::new(
        table
            .columns()
            .iter()
            .map(|name| Cell::from(name.clone()))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let visible = area.height.saturating_sub(3) as usize;
    let rows = table
        .rows()
        .iter()
        .skip(scroll)
        .take(visible.max(1))
        .map(|row| {
            Row::new(
                row.iter()
                    .map(|cell| Cell::from(cell.raw().to_string()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();
    let widths = vec![Constraint::Fill(1); table.columns().len().max(1)];
    let widget = Table::new(rows, widths).header(header).block(
        Block::default().borders(Borders::ALL).title(format!(
            "{title} · {} rânduri · {}-{}",
            table.row_count(),
            (scroll + 1).min(table.row_count()),
            (scroll + visible).min(table.row_count())
        )),
    );
    frame.render_widget(widget, area);
}

fn draw_text_area(frame: &mut ratatui::Frame, text: &str, title: &str, focused: bool, area: Rect) {
    let mut content = text.to_string();
    if focused {
        content.push('_');
    }
    let lines = content
        .split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect::<Vec<_>>();
    let overflow = (lines.len() as u16).saturating_sub(area.height.saturating_sub(2));
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let paragraph = Paragraph::new(lines).scroll((overflow, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(paragraph, area);
}

fn draw_status_line<C: DriveClient>(dashboard: &Dashboard<'_, C>) -> Paragraph<'static> {
    let keys = match (dashboard.focus, dashboard.section) {
        (Focus::Menu, _) => "↑/↓ choose  Enter open  Esc quit  F1 help  F4 logs",
        (Focus::Section, Section::Projects) => {
            "Enter open/pick  ⌫ back  Ctrl+↑/↓ list  Ctrl+R reload  Ctrl+S save CSV  Ctrl+D save list  Esc menu"
        }
        (Focus::Section, Section::Committees) => {
            "Ctrl+T source  Enter open/pick  Ctrl+↑/↓ roster  Ctrl+R extract  Ctrl+S save  Esc menu"
        }
        (Focus::Section, Section::Check) => "type numbers  Ctrl+R verify  ↑/↓ PgUp/PgDn results  Ctrl+S save missing  Esc menu",
    };
    let status = match dashboard.status.as_ref() {
        Some(status) => {
            let color = match status.kind {
                StatusKind::Info => Color::Gray,
                StatusKind::Success => Color::Green,
                StatusKind::Warning => Color::Yellow,
                StatusKind::Error => Color::Red,
            };
            Span::styled(status.text.clone(), Style::default().fg(color))
        }
        None => Span::styled("ready", Style::default().fg(Color::Gray)),
    };
    Paragraph::new(vec![
        Line::from(status),
        Line::from(Span::styled(keys, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::TOP))
}

fn draw_logs<C: DriveClient>(frame: &mut ratatui::Frame, dashboard: &Dashboard<'_, C>, tick: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(frame.area());
    frame.render_widget(draw_header(dashboard, tick), chunks[0]);

    let logs = dashboard.log.lines();
    let visible = chunks[1].height.saturating_sub(1) as usize;
    let start = logs
        .len()
        .saturating_sub(dashboard.log_scroll as usize + visible);
    let mut lines = vec![Line::from(Span::styled(
        "LOGS (PgUp/PgDown to scroll, Esc to return)",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))];
    lines.extend(
        logs.into_iter()
            .skip(start)
            .take(visible)
            .map(Line::from),
    );
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[1]);
}

fn draw_help(frame: &mut ratatui::Frame) {
    let block = Block::default().borders(Borders::ALL).title("Help");
    let lines = vec![
        Line::from("F1 Help  F4 Logs  Esc back / quit  Ctrl+C quit"),
        Line::from("Menu: ↑/↓ choose a section, Enter or 1-3 to open it"),
        Line::from("1. Enter opens a CSV; Ctrl+S saves it, Ctrl+D saves the identifier list"),
        Line::from("2. Ctrl+T switches manual/CSV; Ctrl+R extracts; Ctrl+S saves the roster"),
        Line::from("3. One project number per line; Ctrl+R verifies; Ctrl+S saves the missing list"),
        Line::from("Result panels: ↑/↓ and PgUp/PgDn in 3; Ctrl+↑/↓ and Ctrl+PgUp/PgDn in 1 and 2"),
    ];
    let view = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(view, frame.area());
}

fn placeholder(title: &str, message: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        Style::default().fg(Color::Gray),
    )))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(title.to_string()))
}

fn file_caption(entry: &FolderEntry) -> Paragraph<'static> {
    Paragraph::new(Line::from(vec![
        Span::styled("Fișier: ", Style::default().fg(Color::Gray)),
        Span::styled(entry.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" — modificat: ", Style::default().fg(Color::Gray)),
        Span::raw(entry.modified_time.clone()),
    ]))
    .block(Block::default().borders(Borders::BOTTOM))
}

fn roster_lines(roster: &CommitteeRoster) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        roster.table.columns().join(" | "),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))];
    lines.extend(roster.table.rows().iter().map(|row| {
        Line::from(
            row.iter()
                .map(|cell| cell.raw().to_string())
                .collect::<Vec<_>>()
                .join(" | "),
        )
    }));
    lines
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn timestamp() -> String {
    let now = SystemTime::now();
    let secs = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs();
    let mins = (secs / 60) % 60;
    let hours = (secs / 3600) % 24;
    let seconds = secs % 60;
    format!("{hours:02}:{mins:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use camino::Utf8PathBuf;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::domain::FolderId;
    use crate::downloads::Downloads;
    use crate::drive::FileListPage;

    struct FakeDrive {
        entries: Vec<FolderEntry>,
        contents: HashMap<String, Vec<u8>>,
    }

    impl DriveClient for FakeDrive {
        fn list_page(
            &self,
            query: &str,
            _page_token: Option<&str>,
        ) -> Result<FileListPage, SheetsError> {
            let files = self
                .entries
                .iter()
                .filter(|entry| {
                    !query.contains("mimeType='text/csv'") || entry.mime_type == "text/csv"
                })
                .cloned()
                .collect();
            Ok(FileListPage {
                files,
                next_page_token: None,
            })
        }

        fn download(&self, file_id: &str) -> Result<Vec<u8>, SheetsError> {
            self.contents
                .get(file_id)
                .cloned()
                .ok_or_else(|| SheetsError::RemoteStatus {
                    status: 404,
                    message: "not found".to_string(),
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

    fn fake_app(temp: &tempfile::TempDir) -> App<FakeDrive> {
        let drive = FakeDrive {
            entries: vec![
                entry("c1", "old.csv", "text/csv", "2024-01-01T00:00:00Z"),
                entry("c2", "new.csv", "text/csv", "2024-03-01T00:00:00Z"),
                entry("p1", "Proj_101_final.pdf", "application/pdf", "2024-02-01T00:00:00Z"),
            ],
            contents: HashMap::from([
                ("c1".to_string(), b"Id,Titlu\n7,a\n".to_vec()),
                (
                    "c2".to_string(),
                    b"Numar,Comisii raport\n101,Juridica\n".to_vec(),
                ),
            ]),
        };
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        App::new(
            drive,
            Some("folder1".parse::<FolderId>().unwrap()),
            Downloads::new_with_path(root),
        )
    }

    fn press(dashboard: &mut Dashboard<'_, FakeDrive>, code: KeyCode) -> bool {
        dashboard.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(dashboard: &mut Dashboard<'_, FakeDrive>, ch: char) -> bool {
        dashboard.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    fn type_text(dashboard: &mut Dashboard<'_, FakeDrive>, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                press(dashboard, KeyCode::Enter);
            } else {
                press(dashboard, KeyCode::Char(ch));
            }
        }
    }

    fn render(dashboard: &Dashboard<'_, FakeDrive>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| draw_ui(frame, dashboard, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn opening_projects_lists_newest_csv_first() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Enter);
        let browser = dashboard.projects.browser.as_ref().unwrap();
        assert_eq!(browser.files[0].name, "new.csv");
        assert_eq!(browser.files.len(), 2);

        press(&mut dashboard, KeyCode::Enter);
        let list = dashboard.projects.list.as_ref().unwrap();
        assert_eq!(list.column, "Numar");
        assert_eq!(list.identifiers, vec!["101"]);
        assert!(render(&dashboard).contains("new.csv"));
    }

    #[test]
    fn missing_identifier_column_offers_picker() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Enter);
        press(&mut dashboard, KeyCode::Down);
        press(&mut dashboard, KeyCode::Enter);
        assert!(dashboard.projects.list.is_none());
        assert!(dashboard.projects.column_picker.is_some());

        press(&mut dashboard, KeyCode::Down);
        press(&mut dashboard, KeyCode::Enter);
        let list = dashboard.projects.list.as_ref().unwrap();
        assert_eq!(list.column, "Titlu");
        assert_eq!(list.identifiers, vec!["a"]);

        ctrl(&mut dashboard, 'd');
        assert!(temp.path().join("lista_proiecte.csv").exists());
    }

    #[test]
    fn committee_csv_extraction_saves_roster() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('2'));
        assert_eq!(dashboard.section(), Section::Committees);
        ctrl(&mut dashboard, 't');
        assert_eq!(dashboard.committees.mode, CommitteeMode::Csv);

        press(&mut dashboard, KeyCode::Enter);
        ctrl(&mut dashboard, 'r');
        let roster = dashboard.committees.roster.as_ref().unwrap();
        assert_eq!(roster.table.columns(), ["Comisii raport", "Numar"]);

        ctrl(&mut dashboard, 's');
        assert!(temp.path().join("comisii_raport.csv").exists());
    }

    #[test]
    fn manual_committee_numbers_are_typed() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('2'));
        type_text(&mut dashboard, "101\n \n102");
        ctrl(&mut dashboard, 'r');
        let roster = dashboard.committees.roster.as_ref().unwrap();
        assert_eq!(roster.table.row_count(), 2);
    }

    #[test]
    fn check_section_reports_missing_numbers() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('3'));
        type_text(&mut dashboard, "101\n103\n");
        ctrl(&mut dashboard, 'r');
        let result = dashboard.check.result.as_ref().unwrap();
        assert_eq!(result.matched[0].files, vec!["Proj_101_final.pdf"]);
        assert_eq!(result.missing, vec!["103"]);

        ctrl(&mut dashboard, 's');
        let saved = std::fs::read_to_string(temp.path().join("proiecte_fara_fisa.txt")).unwrap();
        assert_eq!(saved, "103");
        assert!(render(&dashboard).contains("Proj_101_final.pdf"));
    }

    #[test]
    fn long_check_results_scroll_into_view() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('3'));
        let numbers: String = (500..560).map(|n| format!("{n}\n")).collect();
        type_text(&mut dashboard, &numbers);
        ctrl(&mut dashboard, 'r');
        assert_eq!(dashboard.check.result.as_ref().unwrap().missing.len(), 60);
        assert!(!render(&dashboard).contains("- 559"));

        for _ in 0..10 {
            press(&mut dashboard, KeyCode::PageDown);
        }
        assert_eq!(dashboard.check.results_scroll, 62);
        assert!(render(&dashboard).contains("- 559"));

        press(&mut dashboard, KeyCode::Up);
        assert_eq!(dashboard.check.results_scroll, 61);
        ctrl(&mut dashboard, 'r');
        assert_eq!(dashboard.check.results_scroll, 0);
    }

    #[test]
    fn long_identifier_list_scrolls_with_ctrl_arrows() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let body: String = std::iter::once("Numar\n".to_string())
            .chain((9100..9150).map(|n| format!("{n}\n")))
            .collect();
        let app = App::new(
            FakeDrive {
                entries: vec![entry("c9", "long.csv", "text/csv", "2024-05-01T00:00:00Z")],
                contents: HashMap::from([("c9".to_string(), body.into_bytes())]),
            },
            Some("folder1".parse::<FolderId>().unwrap()),
            Downloads::new_with_path(root),
        );
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Enter);
        press(&mut dashboard, KeyCode::Enter);
        assert_eq!(dashboard.projects.list.as_ref().unwrap().identifiers.len(), 50);
        assert!(!render(&dashboard).contains("9149"));

        for _ in 0..60 {
            dashboard.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::CONTROL));
        }
        assert_eq!(dashboard.projects.list_scroll, 49);
        assert!(render(&dashboard).contains("9149"));
    }

    #[test]
    fn manual_roster_scrolls_with_page_keys() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('2'));
        let numbers: String = (700..740).map(|n| format!("{n}\n")).collect();
        type_text(&mut dashboard, &numbers);
        ctrl(&mut dashboard, 'r');
        assert_eq!(dashboard.committees.roster.as_ref().unwrap().table.row_count(), 40);

        for _ in 0..5 {
            press(&mut dashboard, KeyCode::PageDown);
        }
        assert_eq!(dashboard.committees.roster_scroll, 40);
        assert!(dashboard.committees.manual.ends_with("739\n"));
    }

    #[test]
    fn missing_folder_id_is_reported_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let app = App::new(
            FakeDrive {
                entries: Vec::new(),
                contents: HashMap::new(),
            },
            None,
            Downloads::new_with_path(root),
        );
        let mut dashboard = Dashboard::new(&app, "! drive_folder_id is not set".to_string());

        assert!(!press(&mut dashboard, KeyCode::Enter));
        let status = dashboard.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(render(&dashboard).contains("drive_folder_id is not set"));
    }

    #[test]
    fn esc_walks_back_then_quits() {
        let temp = tempfile::tempdir().unwrap();
        let app = fake_app(&temp);
        let mut dashboard = Dashboard::new(&app, "folder1".to_string());

        press(&mut dashboard, KeyCode::Char('3'));
        press(&mut dashboard, KeyCode::F(4));
        assert!(!press(&mut dashboard, KeyCode::Esc));
        assert!(!press(&mut dashboard, KeyCode::Esc));
        assert!(press(&mut dashboard, KeyCode::Esc));
    }
}
