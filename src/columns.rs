use crate::domain::ColumnResolution;

/// Identifier column names, most preferred first.
pub const IDENTIFIER_COLUMNS: &[&str] = &[
    "Numar",
    "NumarProiect",
    "Număr",
    "Nr. înregistrare",
    "Numar_proiect",
];

/// Reporting committee column names, most preferred first.
pub const COMMITTEE_COLUMNS: &[&str] = &[
    "Comisii raport",
    "Comisii_raport",
    "Comisii",
    "ComisiiRaport",
];

/// Tries `candidates` in order against `columns`; exact, case-sensitive.
pub fn resolve_column<S: AsRef<str>>(columns: &[S], candidates: &[&str]) -> ColumnResolution {
    candidates
        .iter()
        .find(|candidate| columns.iter().any(|column| column.as_ref() == **candidate))
        .map(|candidate| ColumnResolution::Found(candidate.to_string()))
        .unwrap_or(ColumnResolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order_beats_column_order() {
        let columns = ["NumarProiect", "Titlu", "Numar"];
        assert_eq!(
            resolve_column(&columns, IDENTIFIER_COLUMNS),
            ColumnResolution::Found("Numar".to_string())
        );
    }

    #[test]
    fn match_is_case_sensitive() {
        let columns = ["numar", "comisii raport"];
        assert_eq!(
            resolve_column(&columns, IDENTIFIER_COLUMNS),
            ColumnResolution::NotFound
        );
        assert_eq!(
            resolve_column(&columns, COMMITTEE_COLUMNS),
            ColumnResolution::NotFound
        );
    }

    #[test]
    fn diacritics_are_distinct_names() {
        let columns = ["Număr"];
        assert_eq!(
            resolve_column(&columns, IDENTIFIER_COLUMNS),
            ColumnResolution::Found("Număr".to_string())
        );
    }

    #[test]
    fn empty_column_set_is_not_found() {
        let columns: [&str; 0] = [];
        assert_eq!(
            resolve_column(&columns, COMMITTEE_COLUMNS),
            ColumnResolution::NotFound
        );
    }
}
