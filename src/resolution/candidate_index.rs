
use log::debug;
use std::path::{Path, PathBuf};

use crate::data_types::cell_value::CellValue;
use crate::parsing::document::{Document, DocumentError, DocumentLoader};

/// Label of the report cell whose neighbour holds the run name
pub const RUN_NAME_LABEL: &str = "Run name";

/// Lists report files under a root folder.
/// Nothing is cached; each call walks the directory again.
#[derive(Clone, Debug)]
pub struct CandidateIndex {
    root: PathBuf
}

impl CandidateIndex {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yields every file under the root that `loader` can open.
    /// Entries are visited in file-name order within each folder, so the order is stable for a fixed directory.
    /// Unreadable directory entries are skipped.
    pub fn candidate_paths<'a>(&'a self, loader: &'a dyn DocumentLoader) -> impl Iterator<Item = PathBuf> + 'a {
        walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    debug!("Skipping unreadable entry under {:?}: {e}", self.root);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(move |path| loader.supports(path))
    }
}

/// A report file under consideration for a run, along with its loaded content
#[derive(Clone, Debug)]
pub struct ReportCandidate {
    path: PathBuf,
    document: Document
}

impl ReportCandidate {
    /// Opens a candidate report.
    /// # Errors
    /// * if the loader cannot read or parse the file
    pub fn open(path: PathBuf, loader: &dyn DocumentLoader) -> Result<Self, DocumentError> {
        let document = loader.open(&path)?;
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn new(path: PathBuf, document: Document) -> Self {
        Self { path, document }
    }

    /// Every text "Run name" declared inside the report, in document order
    pub fn run_names(&self) -> impl Iterator<Item = &str> {
        self.document.lookup_cells(RUN_NAME_LABEL)
            .filter_map(CellValue::as_text)
    }

    /// Every word of every text cell, split on commas and spaces
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.document.text_cells()
            .flat_map(|text| text.split([',', ' ']))
            .filter(|token| !token.is_empty())
    }
}
