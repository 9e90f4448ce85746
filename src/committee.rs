use serde::Serialize;

use crate::columns::{COMMITTEE_COLUMNS, resolve_column};
use crate::domain::ColumnResolution;
use crate::downloads::Artifact;
use crate::error::SheetsError;
use crate::table::{CellValue, CsvTable};

pub const IDENTIFIER_COLUMN: &str = "Numar";
pub const COMMITTEE_COLUMN: &str = "Comisii raport";
pub const AUTO_ROSTER_FILE: &str = "comisii_raport.csv";
pub const CUSTOM_ROSTER_FILE: &str = "comisii_raport_custom.csv";
pub const MANUAL_ROSTER_FILE: &str = "comisii_raport_manual.csv";

/// How a roster was produced; decides the download name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterSource {
    Manual,
    Detected,
    Chosen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitteeRoster {
    pub source: RosterSource,
    pub table: CsvTable,
}

impl CommitteeRoster {
    pub fn file_name(&self) -> &'static str {
        match self.source {
            RosterSource::Manual => MANUAL_ROSTER_FILE,
            RosterSource::Detected => AUTO_ROSTER_FILE,
            RosterSource::Chosen => CUSTOM_ROSTER_FILE,
        }
    }

    pub fn artifact(&self) -> Result<Artifact, SheetsError> {
        Ok(Artifact::csv(self.file_name(), self.table.to_csv_bytes()?))
    }
}

/// Result of the automatic extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(CommitteeRoster),
    NotFound,
}

/// Roster skeleton for typed-in project numbers; committees are left blank.
pub fn roster_from_numbers(numbers: &[String]) -> CommitteeRoster {
    let rows = numbers
        .iter()
        .map(|number| vec![CellValue::Text(number.clone()), CellValue::Empty])
        .collect();
    CommitteeRoster {
        source: RosterSource::Manual,
        table: CsvTable::new(
            vec![IDENTIFIER_COLUMN.to_string(), COMMITTEE_COLUMN.to_string()],
            rows,
        ),
    }
}

pub fn resolve_committee_column(table: &CsvTable) -> ColumnResolution {
    resolve_column(table.columns(), COMMITTEE_COLUMNS)
}

/// Pairs the detected committee column with the table's first column, which
/// stands in as the identifier whatever it actually holds.
pub fn extract_committees(table: &CsvTable) -> Result<Extraction, SheetsError> {
    let ColumnResolution::Found(column) = resolve_committee_column(table) else {
        return Ok(Extraction::NotFound);
    };
    let Some(first) = table.columns().first() else {
        return Ok(Extraction::NotFound);
    };

    let committees = table.column_values(&column)?;
    let identifiers = table.column_values(first)?;
    let rows = committees
        .into_iter()
        .zip(identifiers)
        .map(|(committee, identifier)| {
            vec![committee.clone(), CellValue::Text(identifier.as_text())]
        })
        .collect();

    Ok(Extraction::Found(CommitteeRoster {
        source: RosterSource::Detected,
        table: CsvTable::new(vec![column, IDENTIFIER_COLUMN.to_string()], rows),
    }))
}

/// Roster holding only the column the user picked.
pub fn roster_from_column(table: &CsvTable, column: &str) -> Result<CommitteeRoster, SheetsError> {
    let rows = table
        .column_values(column)?
        .into_iter()
        .map(|value| vec![value.clone()])
        .collect();
    Ok(CommitteeRoster {
        source: RosterSource::Chosen,
        table: CsvTable::new(vec![column.to_string()], rows),
    })
}
