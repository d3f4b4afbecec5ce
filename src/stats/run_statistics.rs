
use chrono::NaiveDate;

use crate::data_types::facility_tables::FacilityTables;
use crate::data_types::report_fields::ReportFields;
use crate::stats::barcodes::UnknownBarcodeSummary;
use crate::stats::read_distribution::ReadDistribution;
use crate::stats::run_metrics::{compute_cluster_ratio, compute_phix_percentages, count_threshold_samples};
use crate::util::rounding::round_half_even;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum AggregationError {
    #[error("empty run: the read counts sum to zero")]
    EmptyRun,
    #[error("statistic {field:?} was already assigned")]
    AlreadyAssigned { field: &'static str },
}

/// Aggregated statistics for a single run.
/// Fields are filled in stages as inputs become available and each one is assigned at most once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStatistics {
    total_reads: Option<u64>,
    std_millions: Option<f64>,
    cv_percent: Option<f64>,
    undetermined_percent: Option<f64>,
    read_distribution: Option<String>,
    top_unknown_barcode: Option<String>,
    top_unknown_barcode_percent: Option<f64>,
    unknown_barcode_distribution: Option<String>,
    phix_barcode: Option<String>,
    phix_output_count: Option<u64>,
    phix_output_percent: Option<f64>,
    phix_input_percent: Option<f64>,
    cluster_ratio: Option<f64>,
    samples_above_requirement: Option<usize>,
    samples_below_requirement: Option<usize>
}

/// Assigns a value once; None values leave the slot untouched
fn assign<T>(slot: &mut Option<T>, value: Option<T>, field: &'static str) -> Result<(), AggregationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if slot.is_some() {
        return Err(AggregationError::AlreadyAssigned { field });
    }
    *slot = Some(value);
    Ok(())
}

impl RunStatistics {
    /// Stores the machine-level read distribution
    pub fn apply_read_distribution(&mut self, distribution: ReadDistribution) -> Result<(), AggregationError> {
        assign(&mut self.total_reads, Some(distribution.total), "total_reads")?;
        assign(&mut self.std_millions, Some(distribution.std_millions), "std_millions")?;
        assign(&mut self.cv_percent, Some(distribution.cv_percent), "cv_percent")?;
        assign(&mut self.undetermined_percent, Some(distribution.undetermined_percent), "undetermined_percent")?;
        assign(&mut self.read_distribution, Some(distribution.distribution), "read_distribution")?;
        Ok(())
    }

    /// Stores the unknown barcode summary
    pub fn apply_unknown_barcodes(&mut self, summary: UnknownBarcodeSummary) -> Result<(), AggregationError> {
        assign(&mut self.top_unknown_barcode, summary.top_barcode, "top_unknown_barcode")?;
        assign(&mut self.top_unknown_barcode_percent, summary.top_percent, "top_unknown_barcode_percent")?;
        assign(&mut self.unknown_barcode_distribution, summary.distribution, "unknown_barcode_distribution")?;
        assign(&mut self.phix_barcode, summary.phix_barcode, "phix_barcode")?;
        assign(&mut self.phix_output_count, summary.phix_count, "phix_output_count")?;
        Ok(())
    }

    /// Derives the statistics that need both the read counts and the report.
    /// Nothing is derived without a total read count; without a report only the PhiX output share is.
    /// # Arguments
    /// * `report` - fields from the resolved report, if any
    /// * `tables` - facility tables
    /// * `run_date` - date of the run
    /// * `phix_protocol_date` - first date (exclusive) with PhiX input tracking
    pub fn apply_report(
        &mut self, report: Option<&ReportFields>, tables: &FacilityTables,
        run_date: NaiveDate, phix_protocol_date: NaiveDate
    ) -> Result<(), AggregationError> {
        let Some(total_reads) = self.total_reads else {
            return Ok(());
        };

        let phix_input = report.and_then(|r| r.phix_input);
        let phix = compute_phix_percentages(
            self.phix_output_count, phix_input, total_reads, run_date, phix_protocol_date
        );
        assign(&mut self.phix_output_percent, phix.output_percent, "phix_output_percent")?;
        assign(&mut self.phix_input_percent, phix.input_percent, "phix_input_percent")?;

        let Some(report) = report else {
            return Ok(());
        };

        let cluster_ratio = report.sequencing_kit.as_deref()
            .and_then(|kit| compute_cluster_ratio(total_reads, kit, tables));
        assign(&mut self.cluster_ratio, cluster_ratio, "cluster_ratio")?;

        if let Some(application) = report.application.as_deref() {
            let (above, below) = count_threshold_samples(
                self.read_distribution.as_deref(), total_reads, application, tables
            );
            assign(&mut self.samples_above_requirement, above, "samples_above_requirement")?;
            assign(&mut self.samples_below_requirement, below, "samples_below_requirement")?;
        }
        Ok(())
    }

    // getters
    pub fn total_reads(&self) -> Option<u64> {
        self.total_reads
    }

    /// Total reads in millions, 2 decimals
    pub fn total_reads_millions(&self) -> Option<f64> {
        self.total_reads.map(|t| round_half_even(t as f64 / 1e6, 2))
    }

    pub fn std_millions(&self) -> Option<f64> {
        self.std_millions
    }

    pub fn cv_percent(&self) -> Option<f64> {
        self.cv_percent
    }

    pub fn undetermined_percent(&self) -> Option<f64> {
        self.undetermined_percent
    }

    pub fn read_distribution(&self) -> Option<&str> {
        self.read_distribution.as_deref()
    }

    pub fn top_unknown_barcode(&self) -> Option<&str> {
        self.top_unknown_barcode.as_deref()
    }

    pub fn top_unknown_barcode_percent(&self) -> Option<f64> {
        self.top_unknown_barcode_percent
    }

    pub fn unknown_barcode_distribution(&self) -> Option<&str> {
        self.unknown_barcode_distribution.as_deref()
    }

    pub fn phix_barcode(&self) -> Option<&str> {
        self.phix_barcode.as_deref()
    }

    pub fn phix_output_count(&self) -> Option<u64> {
        self.phix_output_count
    }

    pub fn phix_output_percent(&self) -> Option<f64> {
        self.phix_output_percent
    }

    pub fn phix_input_percent(&self) -> Option<f64> {
        self.phix_input_percent
    }

    pub fn cluster_ratio(&self) -> Option<f64> {
        self.cluster_ratio
    }

    pub fn samples_above_requirement(&self) -> Option<usize> {
        self.samples_above_requirement
    }

    pub fn samples_below_requirement(&self) -> Option<usize> {
        self.samples_below_requirement
    }
}
