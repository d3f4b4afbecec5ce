/*!
# Pipeline
Drives the per-run collection: read counts, unknown barcodes, report resolution, and the derived statistics.
Runs are processed one at a time; the resolution cache is written after each lookup.
*/

use anyhow::Context;
use chrono::NaiveDate;
use derive_builder::Builder;
use indicatif::ProgressIterator;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::data_types::facility_tables::FacilityTables;
use crate::data_types::report_fields::ReportFields;
use crate::data_types::run_id::RunIdentifier;
use crate::data_types::run_record::RunRecord;
use crate::parsing::demux_stats::{bysample_path, load_sample_counts, load_unknown_barcodes, stats_json_path};
use crate::parsing::document::FileDocumentLoader;
use crate::parsing::report_parser::extract_report_fields;
use crate::resolution::candidate_index::CandidateIndex;
use crate::resolution::matcher::{MatchConfigBuilder, Matcher};
use crate::resolution::resolution_cache::{JsonResolutionCache, DEFAULT_RETRY_DAYS};
use crate::resolution::resolver::{ReportResolver, ResolutionOutcome};
use crate::stats::barcodes::summarize_unknown_barcodes;
use crate::stats::read_distribution::compute_read_distribution;
use crate::stats::run_statistics::RunStatistics;
use crate::util::progress_bar::get_progress_style;

/// Controls report resolution and the date-dependent statistics
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct PipelineConfig {
    /// PhiX input is only reported for runs strictly after this date
    phix_protocol_date: NaiveDate,
    /// Days after the run date during which a missing report is searched for again
    retry_days: i64,
    /// Largest edit distance between a flowcell ID and a report token
    max_edit_distance: usize
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            phix_protocol_date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap_or(NaiveDate::MIN),
            retry_days: DEFAULT_RETRY_DAYS,
            max_edit_distance: 1
        }
    }
}

impl PipelineConfig {
    pub fn phix_protocol_date(&self) -> NaiveDate {
        self.phix_protocol_date
    }

    pub fn retry_days(&self) -> i64 {
        self.retry_days
    }

    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }
}

/// Builds a resolver over the report folder, backed by the JSON cache at `cache_filename`
/// # Errors
/// * if the match config cannot be built
pub fn build_resolver(report_dir: &Path, cache_filename: &Path, config: &PipelineConfig) -> anyhow::Result<ReportResolver> {
    let match_config = MatchConfigBuilder::default()
        .max_edit_distance(config.max_edit_distance())
        .build()?;
    let matcher = Matcher::new(
        CandidateIndex::new(report_dir.to_path_buf()),
        Box::new(FileDocumentLoader),
        match_config
    );
    let cache = JsonResolutionCache::load(cache_filename.to_path_buf(), config.retry_days());
    Ok(ReportResolver::new(matcher, Box::new(cache)))
}

/// Lists the sequencing run folders directly under `run_root`, sorted by name.
/// Folders whose name is not a valid run identifier are skipped.
/// # Errors
/// * if `run_root` cannot be read
pub fn list_run_folders(run_root: &Path) -> anyhow::Result<Vec<(PathBuf, RunIdentifier)>> {
    let entries = std::fs::read_dir(run_root)
        .with_context(|| format!("Error while reading run folder {run_root:?}:"))?;

    let mut runs = vec![];
    for entry in entries {
        let entry = entry.with_context(|| format!("Error while reading run folder {run_root:?}:"))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let folder_name = entry.file_name().to_string_lossy().to_string();
        match RunIdentifier::parse(&folder_name) {
            Ok(run) => runs.push((path, run)),
            Err(e) => debug!("Skipping {path:?}: {e}")
        }
    }
    runs.sort_by(|a, b| a.1.name().cmp(b.1.name()));
    Ok(runs)
}

/// Collects the statistics for each run, one at a time
pub struct RunCollector {
    resolver: ReportResolver,
    tables: FacilityTables,
    config: PipelineConfig
}

impl RunCollector {
    pub fn new(resolver: ReportResolver, tables: FacilityTables, config: PipelineConfig) -> Self {
        Self { resolver, tables, config }
    }

    /// Collects every run under `run_root`, sorted by run date and then run name.
    /// Problems with a single run are logged and leave the affected fields empty.
    /// # Errors
    /// * if `run_root` cannot be listed
    pub fn collect_all(&mut self, run_root: &Path) -> anyhow::Result<Vec<RunRecord>> {
        let runs = list_run_folders(run_root)?;
        info!("Found {} run folders in {run_root:?}", runs.len());

        let style = get_progress_style();
        let mut records: Vec<RunRecord> = runs.into_iter()
            .progress_with_style(style)
            .map(|(run_folder, run)| self.collect_run(&run_folder, run))
            .collect();

        records.sort_by(|a, b| {
            a.run.date().cmp(&b.run.date())
                .then_with(|| a.run.name().cmp(b.run.name()))
        });
        Ok(records)
    }

    /// Collects a single run
    /// # Arguments
    /// * `run_folder` - the run output folder with the demultiplexing stats
    /// * `run` - the parsed run folder name
    pub fn collect_run(&mut self, run_folder: &Path, run: RunIdentifier) -> RunRecord {
        let mut statistics = RunStatistics::default();

        // machine-side read counts
        let bysample_fn = bysample_path(run_folder);
        match load_sample_counts(&bysample_fn) {
            Ok(counts) => {
                match compute_read_distribution(&counts.ordered_counts()) {
                    Ok(distribution) => {
                        if let Err(e) = statistics.apply_read_distribution(distribution) {
                            error!("{run}: {e}");
                        }
                    },
                    Err(e) => error!("{run}: {e}")
                }
            },
            Err(e) => warn!("{run}: skipping read distribution: {e:#}")
        };

        let stats_fn = stats_json_path(run_folder);
        match load_unknown_barcodes(&stats_fn) {
            Ok(barcodes) => {
                if let Err(e) = statistics.apply_unknown_barcodes(summarize_unknown_barcodes(&barcodes)) {
                    error!("{run}: {e}");
                }
            },
            Err(e) => error!("{run}: no unknown barcode stats: {e:#}")
        };

        // report side
        let outcome = self.resolver.resolve(&run);
        debug!("{run}: report resolution {} {:?}", outcome.as_ref(), outcome.report_path());
        let report = self.load_report(&run, &outcome);

        if let Err(e) = statistics.apply_report(
            report.as_ref(), &self.tables, run.date(), self.config.phix_protocol_date()
        ) {
            error!("{run}: {e}");
        }

        let expected_clusters = report.as_ref()
            .and_then(|r| r.sequencing_kit.as_deref())
            .and_then(|kit| self.tables.expected_clusters(kit))
            .map(|label| label.to_string());
        let sequencer = self.tables.sequencer_name(run.instrument_id()).to_string();

        RunRecord {
            run,
            sequencer,
            outcome,
            report,
            expected_clusters,
            statistics
        }
    }

    /// Loads the resolved report; a report that fails to load is treated as unresolved
    fn load_report(&self, run: &RunIdentifier, outcome: &ResolutionOutcome) -> Option<ReportFields> {
        let report_path = outcome.report_path()?;
        match self.resolver.matcher().loader().open(report_path) {
            Ok(document) => Some(extract_report_fields(report_path, &document, &self.tables)),
            Err(e) => {
                match outcome {
                    ResolutionOutcome::Cached(_) => warn!(
                        "{run}: failed to load cached report: {e}; remove the {run} entry from the resolution cache to search again"
                    ),
                    _ => warn!("{run}: failed to load resolved report: {e}")
                }
                None
            }
        }
    }
}
