
use chrono::NaiveDate;

use crate::data_types::facility_tables::FacilityTables;
use crate::stats::read_distribution::parse_distribution;
use crate::util::rounding::round_half_even;

/// PhiX output (observed) and input (declared) percentages for a run
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhixPercentages {
    /// Observed PhiX reads over total reads, 2 decimals
    pub output_percent: Option<f64>,
    /// Declared PhiX loading, 2 decimals; None when PhiX was not tracked on the run date
    pub input_percent: Option<f64>
}

/// Ratio of total reads to the kit's rated maximum clusters, 2 decimals.
/// Unrecognized kits give None since the kit table grows over time.
/// # Arguments
/// * `total_reads` - all reads of the run
/// * `sequencing_kit` - kit name from the report, any case
/// * `tables` - facility tables with the kit capacities
pub fn compute_cluster_ratio(total_reads: u64, sequencing_kit: &str, tables: &FacilityTables) -> Option<f64> {
    let max_clusters = tables.max_clusters(sequencing_kit)?;
    if max_clusters == 0 {
        return None;
    }
    Some(round_half_even(total_reads as f64 / max_clusters as f64, 2))
}

/// Computes both PhiX percentages.
/// # Arguments
/// * `phix_output_count` - reads carrying the PhiX barcode, if one was found
/// * `phix_input` - PhiX loading declared in the report
/// * `total_reads` - all reads of the run
/// * `run_date` - date of the run
/// * `protocol_date` - PhiX input is only reported for runs strictly after this date
pub fn compute_phix_percentages(
    phix_output_count: Option<u64>, phix_input: Option<f64>, total_reads: u64,
    run_date: NaiveDate, protocol_date: NaiveDate
) -> PhixPercentages {
    let output_percent = match phix_output_count {
        Some(count) if total_reads > 0 => Some(round_half_even(count as f64 / total_reads as f64 * 100.0, 2)),
        _ => None
    };

    // before the protocol date PhiX loading was not tracked, which is not the same as zero
    let input_percent = if run_date > protocol_date {
        phix_input.map(|value| round_half_even(value, 2))
    } else {
        None
    };

    PhixPercentages {
        output_percent,
        input_percent
    }
}

/// Counts samples meeting the per-sample read requirement of the application.
/// Returns `(None, None)` when the application has no requirement or the distribution is unknown.
/// # Arguments
/// * `distribution` - the read distribution string, undetermined share last
/// * `total_reads` - all reads of the run
/// * `application` - canonical application name
/// * `tables` - facility tables with the per-application requirements
pub fn count_threshold_samples(
    distribution: Option<&str>, total_reads: u64, application: &str, tables: &FacilityTables
) -> (Option<usize>, Option<usize>) {
    let Some(threshold) = tables.min_reads_per_sample(application) else {
        return (None, None);
    };
    let Some(percentages) = distribution.and_then(parse_distribution) else {
        return (None, None);
    };

    let sample_counts: Vec<f64> = percentages.iter()
        .map(|pct| pct * total_reads as f64 / 100.0)
        .collect();

    // the last entry is the undetermined bucket
    let samples = match sample_counts.split_last() {
        Some((_undetermined, samples)) => samples,
        None => &[]
    };
    let (above, below) = classify_sample_counts(samples, threshold as f64);
    (Some(above), Some(below))
}

/// Returns `(above, below)` where a count equal to the threshold counts as above
pub fn classify_sample_counts(sample_counts: &[f64], threshold: f64) -> (usize, usize) {
    let below = sample_counts.iter()
        .filter(|&&count| count < threshold)
        .count();
    (sample_counts.len() - below, below)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx_eq::assert_approx_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cluster_ratio() {
        let tables = FacilityTables::default();
        assert_eq!(compute_cluster_ratio(100_000_000, "NextSeq 500/550 High Output Kit v2.5 (75 Cycles)", &tables), Some(0.25));
        assert_eq!(compute_cluster_ratio(13_000_000, "miseq reagent kit v2 (300-cycles)", &tables), Some(0.87));
        assert_eq!(compute_cluster_ratio(13_000_000, "miseq reagent kit v9", &tables), None);
    }

    #[test]
    fn test_phix_protocol_cutoff() {
        let protocol_date = date(2024, 1, 16);

        let before = compute_phix_percentages(Some(80_000), Some(1.5), 100_000_000, date(2024, 1, 10), protocol_date);
        assert_eq!(before.input_percent, None);
        assert_approx_eq!(before.output_percent.unwrap(), 0.08);

        let on_the_day = compute_phix_percentages(None, Some(1.5), 100_000_000, protocol_date, protocol_date);
        assert_eq!(on_the_day.input_percent, None);
        assert_eq!(on_the_day.output_percent, None);

        let after = compute_phix_percentages(None, Some(1.5), 100_000_000, date(2024, 2, 1), protocol_date);
        assert_eq!(after.input_percent, Some(1.5));

        let rounded = compute_phix_percentages(None, Some(1.125), 1, date(2024, 2, 1), protocol_date);
        assert_eq!(rounded.input_percent, Some(1.12));
    }

    #[test]
    fn test_phix_output_zero_total() {
        let result = compute_phix_percentages(Some(10), None, 0, date(2024, 2, 1), date(2024, 1, 16));
        assert_eq!(result, PhixPercentages::default());
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(classify_sample_counts(&[10_000_000.0], 10_000_000.0), (1, 0));
        assert_eq!(classify_sample_counts(&[9_999_999.0], 10_000_000.0), (0, 1));
        assert_eq!(classify_sample_counts(&[], 10_000_000.0), (0, 0));
    }

    #[test]
    fn test_count_threshold_samples() {
        let tables = FacilityTables::default();

        // 3mRNAseq requires 10M reads; 10.0% of 100M is exactly the requirement
        assert_eq!(
            count_threshold_samples(Some("10.0-9.9-45.0-35.1"), 100_000_000, "3mRNAseq", &tables),
            (Some(2), Some(1))
        );

        // the undetermined entry is never classified, even when it is large
        assert_eq!(
            count_threshold_samples(Some("5.0-95.0"), 100_000_000, "3mRNAseq", &tables),
            (Some(0), Some(1))
        );

        // no requirement defined / unknown application / unknown distribution
        assert_eq!(count_threshold_samples(Some("50.0-50.0"), 100_000_000, "RNAseq", &tables), (None, None));
        assert_eq!(count_threshold_samples(Some("50.0-50.0"), 100_000_000, "unknown", &tables), (None, None));
        assert_eq!(count_threshold_samples(None, 100_000_000, "3mRNAseq", &tables), (None, None));
    }
}
