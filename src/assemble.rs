//! Output planning: names one output file per group and records the plan in
//! a per-document JSON manifest.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::batch::{AssemblyError, DocumentAssembler};
use crate::source::document_name;
use crate::{Category, DocumentGroup};

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("filename pattern is valid"));

/// Replace characters that are not allowed in file names with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "_").into_owned()
}

/// One planned output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub file_name: String,
    pub category: Category,
    /// 1-based page numbers.
    pub pages: Vec<usize>,
}

/// Where a page ended up. Blank pages have no entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub page: usize,
    pub category: Category,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub document: String,
    pub outputs: Vec<OutputFile>,
    pub page_info: Vec<PageEntry>,
}

impl Manifest {
    /// Plan file names for `groups`. A name is taken when an earlier group of
    /// this document used it or `taken` reports it as existing; taken names
    /// get a `-1`, `-2`, ... suffix.
    pub fn plan(
        document: &str,
        groups: &[DocumentGroup],
        taken: impl Fn(&str) -> bool,
    ) -> Self {
        let base = sanitize_filename(document);
        let mut used = HashSet::new();
        let mut outputs = Vec::with_capacity(groups.len());
        let mut page_info = Vec::new();

        for group in groups {
            let stem = format!("{base}_{}", sanitize_filename(group.category.as_str()));
            let mut file_name = format!("{stem}.pdf");
            let mut counter = 1;
            while used.contains(&file_name) || taken(&file_name) {
                file_name = format!("{stem}-{counter}.pdf");
                counter += 1;
            }
            used.insert(file_name.clone());

            let pages: Vec<usize> = group.page_indices.iter().map(|i| i + 1).collect();
            page_info.extend(pages.iter().map(|&page| PageEntry {
                page,
                category: group.category.clone(),
                file_name: file_name.clone(),
            }));
            outputs.push(OutputFile {
                file_name,
                category: group.category.clone(),
                pages,
            });
        }
        page_info.sort_by_key(|entry| entry.page);

        Self {
            document: document.to_string(),
            outputs,
            page_info,
        }
    }
}

/// Writes `<document>_manifest.json` into an output directory.
#[derive(Debug, Clone)]
pub struct ManifestAssembler {
    output_dir: PathBuf,
}

impl ManifestAssembler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn manifest_path(&self, document: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_manifest.json", sanitize_filename(document)))
    }

    fn write_manifest(&self, path: &Path, manifest: &Manifest) -> Result<(), AssemblyError> {
        let io_err = |source| AssemblyError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        serde_json::to_writer_pretty(&mut writer, manifest)?;
        writer.flush().map_err(io_err)
    }
}

impl DocumentAssembler for ManifestAssembler {
    fn assemble(&self, document: &Path, groups: &[DocumentGroup]) -> Result<(), AssemblyError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| AssemblyError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let name = document_name(document);
        if groups.is_empty() {
            tracing::warn!(document = %name, "no non-blank pages; manifest lists no outputs");
        }
        let manifest = Manifest::plan(&name, groups, |file| self.output_dir.join(file).exists());
        let path = self.manifest_path(&name);
        self.write_manifest(&path, &manifest)?;
        tracing::info!(manifest = %path.display(), outputs = manifest.outputs.len(), "manifest written");
        Ok(())
    }
}
