
use derive_builder::Builder;
use log::{debug, trace};
use std::path::PathBuf;
use strsim::levenshtein;

use crate::data_types::run_id::RunIdentifier;
use crate::parsing::document::DocumentLoader;
use crate::resolution::candidate_index::{CandidateIndex, ReportCandidate};

/// Controls how strictly reports are matched to runs
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct MatchConfig {
    /// Largest edit distance between the flowcell ID and a report token that still counts as a match
    max_edit_distance: usize
}

impl Default for MatchConfig {
    fn default() -> Self {
        // one transcription error in a hand-typed flowcell ID
        Self {
            max_edit_distance: 1
        }
    }
}

impl MatchConfig {
    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }
}

/// Finds the report that belongs to a run.
/// Reports are first narrowed by their declared run date; only ties are broken with the flowcell ID.
pub struct Matcher {
    index: CandidateIndex,
    loader: Box<dyn DocumentLoader>,
    config: MatchConfig
}

impl Matcher {
    pub fn new(index: CandidateIndex, loader: Box<dyn DocumentLoader>, config: MatchConfig) -> Self {
        Self { index, loader, config }
    }

    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    pub fn loader(&self) -> &dyn DocumentLoader {
        self.loader.as_ref()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Returns the report for `run`, if one can be identified.
    /// Candidates that fail to load are skipped.
    /// When more than one report shares the run date, the first one in index order holding a token close to the
    /// flowcell ID wins.
    pub fn resolve(&self, run: &RunIdentifier) -> Option<PathBuf> {
        let mut same_date = self.date_candidates(run);
        debug!("{run}: {} report(s) declare run date {}", same_date.len(), run.date_prefix());

        match same_date.len() {
            0 => None,
            1 => same_date.pop().map(ReportCandidate::into_path),
            _ => self.identifier_match(run, same_date)
        }
    }

    /// Every loadable candidate with a "Run name" that starts with the run's date prefix
    fn date_candidates(&self, run: &RunIdentifier) -> Vec<ReportCandidate> {
        let date_prefix = run.date_prefix();
        self.index.candidate_paths(self.loader.as_ref())
            .filter_map(|path| match ReportCandidate::open(path, self.loader.as_ref()) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    debug!("Skipping report candidate: {e}");
                    None
                }
            })
            .filter(|candidate| {
                candidate.run_names()
                    .any(|run_name| run_name.starts_with(date_prefix))
            })
            .collect()
    }

    /// First candidate with a token within the edit distance of the flowcell ID
    fn identifier_match(&self, run: &RunIdentifier, candidates: Vec<ReportCandidate>) -> Option<PathBuf> {
        let Some(flowcell_id) = run.flowcell_id() else {
            debug!("{run}: no flowcell ID to break the tie between {} reports", candidates.len());
            return None;
        };

        let max_distance = self.config.max_edit_distance();
        candidates.into_iter()
            .find(|candidate| {
                candidate.tokens().any(|token| {
                    let distance = levenshtein(flowcell_id, token);
                    if distance <= max_distance {
                        trace!("{run}: token {token:?} in {:?} is {distance} edit(s) from {flowcell_id}", candidate.path());
                        true
                    } else {
                        false
                    }
                })
            })
            .map(ReportCandidate::into_path)
    }
}
