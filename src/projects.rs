use serde::Serialize;

use crate::columns::{IDENTIFIER_COLUMNS, resolve_column};
use crate::domain::ColumnResolution;
use crate::downloads::Artifact;
use crate::error::SheetsError;
use crate::table::{CellValue, CsvTable};

pub const IDENTIFIER_LIST_FILE: &str = "lista_proiecte.csv";

/// Identifiers pulled out of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectList {
    pub column: String,
    pub identifiers: Vec<String>,
}

impl ProjectList {
    pub fn render(&self) -> String {
        render_identifiers(&self.identifiers)
    }

    pub fn artifact(&self) -> Result<Artifact, SheetsError> {
        let table = CsvTable::new(
            vec![self.column.clone()],
            self.identifiers
                .iter()
                .map(|value| vec![CellValue::Text(value.clone())])
                .collect(),
        );
        Ok(Artifact::csv(IDENTIFIER_LIST_FILE, table.to_csv_bytes()?))
    }
}

pub fn resolve_identifier_column(table: &CsvTable) -> ColumnResolution {
    resolve_column(table.columns(), IDENTIFIER_COLUMNS)
}

/// Values of `column` as text, in row order.
pub fn identifiers(table: &CsvTable, column: &str) -> Result<ProjectList, SheetsError> {
    let identifiers = table
        .column_values(column)?
        .into_iter()
        .map(CellValue::as_text)
        .collect();
    Ok(ProjectList {
        column: column.to_string(),
        identifiers,
    })
}

pub fn render_identifiers(identifiers: &[String]) -> String {
    identifiers.join("\n")
}

/// The loaded table re-serialised under the source file's name.
pub fn passthrough_artifact(table: &CsvTable, file_name: &str) -> Result<Artifact, SheetsError> {
    Ok(Artifact::csv(file_name, table.to_csv_bytes()?))
}
