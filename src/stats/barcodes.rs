
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::stats::read_distribution::share_percent;

/// Paired-end index read pattern of the PhiX spike-in
pub const PHIX_PAIRED_BARCODE: &str = "GGGGGGGGGG+AGATCTCGGT";
/// Number of leading shares kept in the unknown barcode distribution string
pub const MAX_DISTRIBUTION_ENTRIES: usize = 15;

/// Summary of the barcodes that were read but not assigned to any sample
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnknownBarcodeSummary {
    /// Most frequent unknown barcode
    pub top_barcode: Option<String>,
    /// Share of the top barcode within the unknown barcode pool, 1 decimal
    pub top_percent: Option<f64>,
    /// Leading non-zero shares of the pool (1 decimal), joined with "-"
    pub distribution: Option<String>,
    /// First barcode in descending count order that looks like PhiX
    pub phix_barcode: Option<String>,
    /// Read count of `phix_barcode`
    pub phix_count: Option<u64>
}

/// Sorts barcodes by descending count; equal counts keep their input order
pub fn sort_barcodes(barcodes: &IndexMap<String, u64>) -> Vec<(&str, u64)> {
    barcodes.iter()
        .map(|(barcode, &count)| (barcode.as_str(), count))
        .sorted_by(|a, b| b.1.cmp(&a.1))
        .collect()
}

/// Returns true for the paired PhiX pattern or a single-end barcode made only of `G`
pub fn is_phix_barcode(barcode: &str) -> bool {
    barcode == PHIX_PAIRED_BARCODE ||
        (!barcode.is_empty() && barcode.chars().all(|c| c == 'G'))
}

/// Scans barcodes in the given order and stops at the first PhiX-like entry.
/// # Arguments
/// * `sorted` - barcodes in descending count order
pub fn find_phix_barcode<'a>(sorted: &[(&'a str, u64)]) -> Option<(&'a str, u64)> {
    let hit = sorted.iter()
        .find(|(barcode, _count)| is_phix_barcode(barcode))
        .copied();
    if let Some((barcode, count)) = hit {
        debug!("Found PhiX barcode {barcode}: {count}");
    }
    hit
}

/// Builds the unknown barcode summary from the per-barcode counts of a run
pub fn summarize_unknown_barcodes(barcodes: &IndexMap<String, u64>) -> UnknownBarcodeSummary {
    let sorted = sort_barcodes(barcodes);
    let (phix_barcode, phix_count) = match find_phix_barcode(&sorted) {
        Some((barcode, count)) => (Some(barcode.to_string()), Some(count)),
        None => (None, None)
    };

    let pool: u64 = sorted.iter().map(|(_barcode, count)| count).sum();
    if pool == 0 {
        return UnknownBarcodeSummary {
            top_barcode: sorted.first().map(|(barcode, _count)| barcode.to_string()),
            phix_barcode,
            phix_count,
            ..Default::default()
        };
    }

    let shares: Vec<f64> = sorted.iter()
        .filter(|(_barcode, count)| *count != 0)
        .map(|(_barcode, count)| share_percent(*count, pool, 1))
        .collect();
    let distribution = shares.iter()
        .take(MAX_DISTRIBUTION_ENTRIES)
        .map(|share| format!("{share:.1}"))
        .join("-");

    UnknownBarcodeSummary {
        top_barcode: sorted.first().map(|(barcode, _count)| barcode.to_string()),
        top_percent: shares.first().copied(),
        distribution: Some(distribution),
        phix_barcode,
        phix_count
    }
}
