use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CheckResult, CommitteesResult, FilesResult, ProjectsResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_files(result: &FilesResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_projects(result: &ProjectsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_committees(result: &CommitteesResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_check(result: &CheckResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Line shown for a folder listing that came back empty.
pub fn empty_listing_message(all: bool) -> &'static str {
    if all {
        "Nu s-au găsit fișiere în folderul Drive."
    } else {
        "Nu s-au găsit fișiere CSV în folderul Drive."
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, event: crate::app::ProgressEvent) {
        tracing::debug!(message = event.message.as_str(), "progress");
    }
}
