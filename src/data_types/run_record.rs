
use crate::data_types::report_fields::ReportFields;
use crate::data_types::run_id::RunIdentifier;
use crate::resolution::resolver::ResolutionOutcome;
use crate::stats::run_statistics::RunStatistics;

/// Everything collected for one run, one row of the output table
#[derive(Clone, Debug)]
pub struct RunRecord {
    /// The parsed run folder name
    pub run: RunIdentifier,
    /// Sequencer name derived from the instrument ID, empty if unknown
    pub sequencer: String,
    /// How the report lookup went
    pub outcome: ResolutionOutcome,
    /// Fields from the report; None if no report was resolved or it failed to load
    pub report: Option<ReportFields>,
    /// Expected cluster label of the report's kit
    pub expected_clusters: Option<String>,
    /// Derived statistics
    pub statistics: RunStatistics
}

impl RunRecord {
    /// A report counts as found only if it was resolved and could be read
    pub fn report_found(&self) -> bool {
        self.report.is_some()
    }
}
