use std::collections::HashMap;
use std::fmt;

use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;

use crate::drive::DriveClient;
use crate::error::SheetsError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A single parsed cell. Numbers keep the text they were written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(String),
    Empty,
}

impl CellValue {
    fn from_field(field: &str) -> Self {
        if field.is_empty() {
            CellValue::Empty
        } else if field.trim().parse::<f64>().is_ok() {
            CellValue::Number(field.to_string())
        } else {
            CellValue::Text(field.to_string())
        }
    }

    /// Raw cell content, empty for missing values.
    pub fn raw(&self) -> &str {
        match self {
            CellValue::Text(value) | CellValue::Number(value) => value,
            CellValue::Empty => "",
        }
    }

    /// Text coercion used for identifier lists; missing values read as `nan`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Number(value) => value.trim().to_string(),
            CellValue::Empty => "nan".to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// Header-defined table parsed from delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl CsvTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = dedupe_columns(columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, SheetsError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|err| SheetsError::Parse(format!("content is not valid UTF-8: {err}")))?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header = reader
            .headers()
            .map_err(|err| SheetsError::Parse(err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if header.is_empty() || (header.len() == 1 && header[0].is_empty()) {
            return Err(SheetsError::Parse("no columns to parse from file".to_string()));
        }

        let width = header.len();
        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|err| SheetsError::Parse(err.to_string()))?;
            if record.len() > width {
                let line = record
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(index as u64 + 2);
                return Err(SheetsError::Parse(format!(
                    "expected {width} fields in line {line}, saw {}",
                    record.len()
                )));
            }
            rows.push(record.iter().map(CellValue::from_field).collect());
        }

        Ok(Self::new(header, rows))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&CellValue>, SheetsError> {
        let index = self
            .column_index(column)
            .ok_or_else(|| SheetsError::ColumnMissing(column.to_string()))?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, SheetsError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(CellValue::raw))
                .map_err(|err| SheetsError::Filesystem(err.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|err| SheetsError::Filesystem(err.to_string()))
    }
}

/// Repeated header names get `.1`, `.2`, ... in order of appearance.
fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::with_capacity(columns.len());
    for name in columns {
        let mut candidate = name.clone();
        while out.contains(&candidate) {
            let count = counts.entry(name.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{name}.{count}");
        }
        out.push(candidate);
    }
    out
}

/// Downloads a file and parses it into a [`CsvTable`].
pub struct CsvLoader<'a, C: DriveClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: DriveClient + ?Sized> CsvLoader<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub fn fetch(&self, file_id: &str) -> Result<CsvTable, SheetsError> {
        let bytes = self.client.download(file_id)?;
        let table = CsvTable::parse(&bytes)?;
        tracing::info!(
            file_id,
            columns = table.columns().len(),
            rows = table.row_count(),
            "loaded CSV"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn counts_match_header_and_lines() {
        let table = CsvTable::parse(b"Numar,Titlu,Data\n101,Lege,2024\n\n102,Cod,\n").unwrap();
        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][2], CellValue::Empty);
    }

    #[test]
    fn classifies_numbers_and_text() {
        let table = CsvTable::parse(b"a,b\n12.5,x\n").unwrap();
        assert_eq!(table.rows()[0][0], CellValue::Number("12.5".to_string()));
        assert_eq!(table.rows()[0][1], CellValue::Text("x".to_string()));
    }

    #[test]
    fn short_rows_are_padded() {
        let table = CsvTable::parse(b"a,b,c\n1\n").unwrap();
        assert_eq!(table.rows()[0].len(), 3);
    }

    #[test]
    fn long_rows_are_rejected() {
        let err = CsvTable::parse(b"a,b\n1,2,3\n").unwrap_err();
        assert_matches!(err, SheetsError::Parse(_));
    }

    #[test]
    fn invalid_utf8_is_a_parse_error() {
        let err = CsvTable::parse(b"a,b\n\xff\xfe,1\n").unwrap_err();
        assert_matches!(err, SheetsError::Parse(_));
    }

    #[test]
    fn empty_content_is_a_parse_error() {
        let err = CsvTable::parse(b"").unwrap_err();
        assert_matches!(err, SheetsError::Parse(_));
    }

    #[test]
    fn bom_is_ignored() {
        let table = CsvTable::parse(b"\xEF\xBB\xBFNumar,b\n1,2\n").unwrap();
        assert_eq!(table.columns()[0], "Numar");
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let table = CsvTable::parse(b"a,a,b,a\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns(), ["a", "a.1", "b", "a.2"]);
    }

    #[test]
    fn quoted_fields_round_trip() {
        let source = b"Numar,Titlu\n101,\"Lege, privind\"\n";
        let table = CsvTable::parse(source).unwrap();
        assert_eq!(table.to_csv_bytes().unwrap(), source.to_vec());
    }
}
