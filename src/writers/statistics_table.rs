
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::report_fields::ReportFields;
use crate::data_types::run_record::RunRecord;
use crate::util::rounding::round_half_even;

/// Contains all the data written to each row of the statistics table
#[derive(Serialize)]
struct StatisticsRow<'a> {
    #[serde(rename = "Project Name")]
    project_name: Option<&'a str>,
    #[serde(rename = "Protocol Name")]
    protocol_name: Option<&'a str>,
    #[serde(rename = "Date")]
    date: String,
    /// True if a report was resolved and loaded
    #[serde(rename = "Sciebo Found")]
    report_found: bool,
    /// cache / search / not found / expired
    #[serde(rename = "Report Source")]
    report_source: &'a str,
    #[serde(rename = "Application")]
    application: Option<&'a str>,
    #[serde(rename = "Sequencer")]
    sequencer: &'a str,
    #[serde(rename = "STD in Millions")]
    std_millions: Option<f64>,
    #[serde(rename = "CV")]
    cv_percent: Option<f64>,
    #[serde(rename = "Undetermined Reads Percentage")]
    undetermined_percent: Option<f64>,
    #[serde(rename = "Most Common Undetermined Barcode")]
    top_unknown_barcode: Option<&'a str>,
    #[serde(rename = "Most Common Undetermined Barcode Percentage")]
    top_unknown_barcode_percent: Option<f64>,
    #[serde(rename = "Undetermined Distribution String")]
    unknown_barcode_distribution: Option<&'a str>,
    #[serde(rename = "Read Distribution")]
    read_distribution: Option<&'a str>,
    #[serde(rename = "Number of Samples Above Requirement")]
    samples_above_requirement: Option<usize>,
    #[serde(rename = "Number of Samples Below Requirement")]
    samples_below_requirement: Option<usize>,
    #[serde(rename = "Sequencing Kit")]
    sequencing_kit: Option<&'a str>,
    #[serde(rename = "Cycles Read 1")]
    cycles_read_1: Option<&'a str>,
    #[serde(rename = "Cycles Index 1")]
    cycles_index_1: Option<&'a str>,
    #[serde(rename = "Cycles Read 2")]
    cycles_read_2: Option<&'a str>,
    #[serde(rename = "Cycles Index 2")]
    cycles_index_2: Option<&'a str>,
    #[serde(rename = "Density")]
    density: Option<&'a str>,
    #[serde(rename = "Clusters PF")]
    clusters_pf: Option<&'a str>,
    #[serde(rename = "Yields")]
    yields: Option<&'a str>,
    #[serde(rename = "Q 30")]
    q30: Option<f64>,
    #[serde(rename = "Phix Input")]
    phix_input_percent: Option<f64>,
    #[serde(rename = "Phix Output Percent")]
    phix_output_percent: Option<f64>,
    #[serde(rename = "Phix Barcode")]
    phix_barcode: Option<&'a str>,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Total Read Count in Millions")]
    total_reads_millions: Option<f64>,
    #[serde(rename = "Expected Clusters")]
    expected_clusters: Option<&'a str>,
    #[serde(rename = "Ratio Total Read Count and Expected Cluster")]
    cluster_ratio: Option<f64>
}

impl<'a> StatisticsRow<'a> {
    fn new(record: &'a RunRecord) -> Self {
        let report = record.report.as_ref();
        let text = |field: fn(&ReportFields) -> &Option<String>| {
            report.and_then(|r| field(r).as_deref())
        };
        let statistics = &record.statistics;

        Self {
            project_name: text(|r| &r.project_name),
            protocol_name: text(|r| &r.protocol_name),
            date: record.run.date().format("%Y-%m-%d").to_string(),
            report_found: record.report_found(),
            report_source: record.outcome.as_ref(),
            application: text(|r| &r.application),
            sequencer: &record.sequencer,
            std_millions: statistics.std_millions(),
            cv_percent: statistics.cv_percent(),
            undetermined_percent: statistics.undetermined_percent(),
            top_unknown_barcode: statistics.top_unknown_barcode(),
            top_unknown_barcode_percent: statistics.top_unknown_barcode_percent(),
            unknown_barcode_distribution: statistics.unknown_barcode_distribution(),
            read_distribution: statistics.read_distribution(),
            samples_above_requirement: statistics.samples_above_requirement(),
            samples_below_requirement: statistics.samples_below_requirement(),
            sequencing_kit: text(|r| &r.sequencing_kit),
            cycles_read_1: text(|r| &r.cycles_read_1),
            cycles_index_1: text(|r| &r.cycles_index_1),
            cycles_read_2: text(|r| &r.cycles_read_2),
            cycles_index_2: text(|r| &r.cycles_index_2),
            density: text(|r| &r.density),
            clusters_pf: text(|r| &r.clusters_pf),
            yields: text(|r| &r.yields),
            q30: report.and_then(|r| r.q30).map(|q| round_half_even(q, 2)),
            phix_input_percent: statistics.phix_input_percent(),
            phix_output_percent: statistics.phix_output_percent(),
            phix_barcode: statistics.phix_barcode(),
            name: record.run.name(),
            total_reads_millions: statistics.total_reads_millions(),
            expected_clusters: record.expected_clusters.as_deref(),
            cluster_ratio: statistics.cluster_ratio()
        }
    }
}

/// Writes one row per run, in the order given
/// # Arguments
/// * `filename` - the output path, `.csv` is comma separated and anything else is tab separated
/// * `records` - the collected runs
pub fn write_statistics_table(filename: &Path, records: &[RunRecord]) -> csv::Result<()> {
    // modify the delimiter to "," if it ends with .csv
    let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
    let delimiter: u8 = if is_csv { b',' } else { b'\t' };
    let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(filename)?;

    for record in records.iter() {
        csv_writer.serialize(StatisticsRow::new(record))?;
    }

    csv_writer.flush()?;
    Ok(())
}
