use serde::Serialize;

use crate::domain::FolderEntry;
use crate::downloads::Artifact;

pub const MISSING_LIST_FILE: &str = "proiecte_fara_fisa.txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetMatch {
    pub number: String,
    pub files: Vec<String>,
}

/// Project numbers split into those with a sheet in the folder and those without.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched: Vec<SheetMatch>,
    pub missing: Vec<String>,
}

impl MatchResult {
    pub fn missing_text(&self) -> String {
        self.missing.join("\n")
    }

    pub fn missing_artifact(&self) -> Artifact {
        Artifact::text(MISSING_LIST_FILE, &self.missing_text())
    }
}

/// Case-sensitive substring match of every number against every entry name.
pub fn check_against(numbers: &[String], entries: &[FolderEntry]) -> MatchResult {
    let mut result = MatchResult::default();
    for number in numbers {
        let files: Vec<String> = entries
            .iter()
            .filter(|entry| entry.name.contains(number.as_str()))
            .map(|entry| entry.name.clone())
            .collect();
        if files.is_empty() {
            result.missing.push(number.clone());
        } else {
            result.matched.push(SheetMatch {
                number: number.clone(),
                files,
            });
        }
    }
    result
}
