
use anyhow::{bail, Context};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::util::json_io::load_json;

/// Sample label used by bcl2fastq for reads that matched no sample barcode
pub const UNDETERMINED_SAMPLE: &str = "undetermined";

/// Location of the per-sample read counts inside a run folder
pub fn bysample_path(run_folder: &Path) -> PathBuf {
    run_folder.join("multiqc").join("multiqc_data").join("multiqc_bcl2fastq_bysample.txt")
}

/// Location of the bcl2fastq demultiplexing stats inside a run folder
pub fn stats_json_path(run_folder: &Path) -> PathBuf {
    run_folder.join("Stats").join("Stats.json")
}

/// Per-sample read counts for one run, with the undetermined bucket kept apart
#[derive(Clone, Debug, PartialEq)]
pub struct SampleCounts {
    /// (sample, reads) in file order, excluding undetermined
    samples: Vec<(String, u64)>,
    /// Reads that matched no sample
    undetermined: u64
}

impl SampleCounts {
    pub fn new(samples: Vec<(String, u64)>, undetermined: u64) -> Self {
        Self { samples, undetermined }
    }

    pub fn samples(&self) -> &[(String, u64)] {
        &self.samples
    }

    pub fn undetermined(&self) -> u64 {
        self.undetermined
    }

    /// All counts in sample order with the undetermined bucket last
    pub fn ordered_counts(&self) -> Vec<u64> {
        self.samples.iter()
            .map(|(_sample, count)| *count)
            .chain(std::iter::once(self.undetermined))
            .collect()
    }
}

#[derive(Deserialize)]
struct BySampleRow {
    #[serde(rename = "Sample")]
    sample: String,
    /// multiqc writes these as floats, e.g. "1234567.0"
    total: f64
}

/// Loads the multiqc bcl2fastq by-sample table (tab-delimited with `Sample` and `total` columns).
/// # Errors
/// * if the file cannot be opened or a row fails to parse
/// * if there is no undetermined row
pub fn load_sample_counts(filename: &Path) -> anyhow::Result<SampleCounts> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;

    let mut samples = vec![];
    let mut undetermined: Option<u64> = None;
    for result in csv_reader.deserialize() {
        let row: BySampleRow = result.with_context(|| format!("Error while reading {filename:?}:"))?;
        if !row.total.is_finite() || row.total < 0.0 {
            bail!("Invalid read count {} for sample {:?} in {filename:?}", row.total, row.sample);
        }
        let count = row.total.round() as u64;
        if row.sample.eq_ignore_ascii_case(UNDETERMINED_SAMPLE) {
            *undetermined.get_or_insert(0) += count;
        } else {
            samples.push((row.sample, count));
        }
    }

    let Some(undetermined) = undetermined else {
        bail!("No {UNDETERMINED_SAMPLE:?} row found in {filename:?}");
    };
    Ok(SampleCounts::new(samples, undetermined))
}

#[derive(Deserialize)]
struct DemuxStats {
    #[serde(rename = "UnknownBarcodes", default)]
    unknown_barcodes: Vec<LaneBarcodes>
}

#[derive(Deserialize)]
struct LaneBarcodes {
    #[serde(rename = "Barcodes", default)]
    barcodes: IndexMap<String, u64>
}

/// Loads the unknown barcode counts from a bcl2fastq `Stats.json`, summed across lanes.
/// Barcodes keep the order they were first seen in.
/// # Errors
/// * if the file cannot be opened or parsed
pub fn load_unknown_barcodes(filename: &Path) -> anyhow::Result<IndexMap<String, u64>> {
    let stats: DemuxStats = load_json(filename)?;
    let mut combined: IndexMap<String, u64> = IndexMap::new();
    for lane in stats.unknown_barcodes {
        for (barcode, count) in lane.barcodes {
            *combined.entry(barcode).or_default() += count;
        }
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_sample_counts() {
        let run_folder = Path::new("test_data/runs/230515_NB501289_0712_AHGTJ5BGXY");
        let counts = load_sample_counts(&bysample_path(run_folder)).unwrap();
        assert_eq!(counts.samples().len(), 3);
        assert_eq!(counts.samples()[0], ("S1_liver".to_string(), 40_000_000));
        assert_eq!(counts.undetermined(), 2_000_000);
        assert_eq!(counts.ordered_counts(), vec![40_000_000, 29_999_999, 28_000_001, 2_000_000]);
    }

    #[test]
    fn test_missing_undetermined() {
        let tmp = tempfile::tempdir().unwrap();
        let filename = tmp.path().join("bysample.txt");
        std::fs::write(&filename, "Sample\ttotal\nS1\t100.0\n").unwrap();
        assert!(load_sample_counts(&filename).is_err());
    }

    #[test]
    fn test_load_unknown_barcodes() {
        let run_folder = Path::new("test_data/runs/230515_NB501289_0712_AHGTJ5BGXY");
        let barcodes = load_unknown_barcodes(&stats_json_path(run_folder)).unwrap();
        let expected: Vec<(&str, u64)> = vec![
            ("GGGGGGGGGG+AGATCTCGGT", 50_000),
            ("ACGTACGTAA+TTGCAAGCTT", 120_000),
            ("GGGGGGGGGG", 80_000),
            ("NNNNNNNNNN+NNNNNNNNNN", 10_000),
        ];
        let observed: Vec<(&str, u64)> = barcodes.iter().map(|(b, c)| (b.as_str(), *c)).collect();
        assert_eq!(observed, expected);
    }
}
