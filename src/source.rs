//! Page sources: pre-extracted OCR text stored as JSON next to the scans,
//! and an in-memory source for embedding callers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::batch::{AcquisitionError, PageRead, PageSource};
use crate::text::normalize_whitespace;
use crate::PageObservation;

/// File name suffix of page data files.
pub const PAGES_SUFFIX: &str = ".pages.json";

/// Name of a document without directories or the page-data suffix.
///
/// `scans/a.pages.json` and `scans/a.pdf` are both document `a`.
#[must_use]
pub fn document_name(document: &Path) -> String {
    let file_name = document
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(stem) = strip_pages_suffix(&file_name) {
        return stem.to_string();
    }
    document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(file_name)
}

fn strip_pages_suffix(file_name: &str) -> Option<&str> {
    let split = file_name.len().checked_sub(PAGES_SUFFIX.len())?;
    if !file_name.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = file_name.split_at(split);
    suffix.eq_ignore_ascii_case(PAGES_SUFFIX).then_some(stem)
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    #[serde(default)]
    text: String,
    #[serde(default)]
    blank: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Reads `<document>.pages.json` files: a JSON array with one entry per page,
/// each `{"text": ..., "blank": bool, "error": optional string}`.
///
/// An entry carrying `error` is an unreadable page. Text is
/// whitespace-normalized on load.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPageSource;

impl JsonPageSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Page data files directly inside `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Io`] if the directory cannot be listed.
    pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, AcquisitionError> {
        let io_err = |source| AcquisitionError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut found = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_pages = path
                .file_name()
                .is_some_and(|n| strip_pages_suffix(&n.to_string_lossy()).is_some());
            if is_pages && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }
}

impl PageSource for JsonPageSource {
    fn read_pages(&self, document: &Path) -> Result<Vec<PageRead>, AcquisitionError> {
        let raw = fs::read_to_string(document).map_err(|source| AcquisitionError::Io {
            path: document.to_path_buf(),
            source,
        })?;
        let entries: Vec<PageEntry> =
            serde_json::from_str(&raw).map_err(|source| AcquisitionError::Format {
                path: document.to_path_buf(),
                source,
            })?;
        tracing::debug!(pages = entries.len(), "page data loaded");

        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match entry.error {
                Some(reason) => PageRead::Unreadable { index, reason },
                None if entry.blank => PageRead::Observed(PageObservation::blank(index)),
                None => PageRead::Observed(PageObservation::text(
                    index,
                    normalize_whitespace(&entry.text),
                )),
            })
            .collect())
    }
}

/// Pages held in memory, keyed by document path.
#[derive(Debug, Default, Clone)]
pub struct MemoryPageSource {
    documents: HashMap<PathBuf, Vec<PageRead>>,
}

impl MemoryPageSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: impl Into<PathBuf>, pages: Vec<PageObservation>) {
        self.insert_reads(document, pages.into_iter().map(PageRead::Observed).collect());
    }

    pub fn insert_reads(&mut self, document: impl Into<PathBuf>, pages: Vec<PageRead>) {
        self.documents.insert(document.into(), pages);
    }
}

impl PageSource for MemoryPageSource {
    fn read_pages(&self, document: &Path) -> Result<Vec<PageRead>, AcquisitionError> {
        self.documents
            .get(document)
            .cloned()
            .ok_or_else(|| AcquisitionError::NotFound {
                path: document.to_path_buf(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_names() {
        assert_eq!(document_name(Path::new("in/a.pages.json")), "a");
        assert_eq!(document_name(Path::new("in/B.PAGES.JSON")), "B");
        assert_eq!(document_name(Path::new("scan.pdf")), "scan");
        assert_eq!(document_name(Path::new("noext")), "noext");
    }

    #[test]
    fn reads_page_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pages.json");
        fs::write(
            &path,
            r#"[
                {"text": "增值税\n  发票"},
                {"blank": true},
                {"error": "engine timeout"},
                {}
            ]"#,
        )
        .unwrap();

        let pages = JsonPageSource.read_pages(&path).unwrap();
        assert_eq!(
            pages,
            vec![
                PageRead::Observed(PageObservation::text(0, "增值税 发票")),
                PageRead::Observed(PageObservation::blank(1)),
                PageRead::Unreadable {
                    index: 2,
                    reason: "engine timeout".into()
                },
                PageRead::Observed(PageObservation::text(3, "")),
            ]
        );
    }

    #[test]
    fn malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pages.json");
        fs::write(&path, "{\"text\": 1}").unwrap();
        assert!(matches!(
            JsonPageSource.read_pages(&path),
            Err(AcquisitionError::Format { .. })
        ));
        assert!(matches!(
            JsonPageSource.read_pages(&dir.path().join("absent.pages.json")),
            Err(AcquisitionError::Io { .. })
        ));
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pages.json", "a.pages.json", "a_manifest.json", "notes.txt"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }
        fs::create_dir(dir.path().join("c.pages.json")).unwrap();
        let found = JsonPageSource::discover(dir.path()).unwrap();
        let names: Vec<String> = found.iter().map(|p| document_name(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
