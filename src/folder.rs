use std::collections::HashSet;

use crate::domain::{FolderEntry, FolderId};
use crate::drive::{DriveClient, folder_query};
use crate::error::SheetsError;

/// Lists the entries of one folder, following continuation tokens.
pub struct FolderIndex<'a, C: DriveClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: DriveClient + ?Sized> FolderIndex<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Returns every non-trashed entry whose parent is `folder_id`, optionally
    /// only those of `mime_type`. The order is whatever the service returns.
    pub fn list(
        &self,
        folder_id: &str,
        mime_type: Option<&str>,
    ) -> Result<Vec<FolderEntry>, SheetsError> {
        let folder: FolderId = folder_id.parse()?;
        let query = folder_query(folder.as_str(), mime_type);

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self.client.list_page(&query, page_token.as_deref())?;
            pages += 1;
            tracing::debug!(
                folder = folder.as_str(),
                page = pages,
                files = page.files.len(),
                "listed folder page"
            );
            for entry in page.files {
                if seen.insert(entry.id.clone()) {
                    entries.push(entry);
                }
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(
            folder = folder.as_str(),
            pages,
            entries = entries.len(),
            "folder listing complete"
        );
        Ok(entries)
    }
}
