
use itertools::Itertools;

use crate::stats::run_statistics::AggregationError;
use crate::util::rounding::round_half_even;

/// Spread and share statistics for the per-sample read counts of one run
#[derive(Clone, Debug, PartialEq)]
pub struct ReadDistribution {
    /// Sum of all counts, undetermined included
    pub total: u64,
    /// Population standard deviation in millions of reads, 2 decimals
    pub std_millions: f64,
    /// Coefficient of variation in percent, 1 decimal
    pub cv_percent: f64,
    /// Undetermined share of the total in percent, 1 decimal
    pub undetermined_percent: f64,
    /// Every count's share of the total (1 decimal), joined with "-", undetermined last
    pub distribution: String
}

/// Computes the read distribution for a run.
/// # Arguments
/// * `counts` - read counts in sample order, with the undetermined bucket as the last entry
/// # Errors
/// * `AggregationError::EmptyRun` if there are no counts or they sum to zero
pub fn compute_read_distribution(counts: &[u64]) -> Result<ReadDistribution, AggregationError> {
    let total: u64 = counts.iter().sum();
    let Some(&undetermined) = counts.last() else {
        return Err(AggregationError::EmptyRun);
    };
    if total == 0 {
        return Err(AggregationError::EmptyRun);
    }

    let n = counts.len() as f64;
    let mean = total as f64 / n;
    let variance = counts.iter()
        .map(|&c| {
            let delta = c as f64 - mean;
            delta * delta
        })
        .sum::<f64>() / n;
    let std = variance.sqrt();

    let distribution = counts.iter()
        .map(|&c| format!("{:.1}", share_percent(c, total, 1)))
        .join("-");

    Ok(ReadDistribution {
        total,
        std_millions: round_half_even(std / 1e6, 2),
        cv_percent: round_half_even(std / mean * 100.0, 1),
        undetermined_percent: share_percent(undetermined, total, 1),
        distribution
    })
}

/// `count / total * 100`, rounded to `decimals`
pub(crate) fn share_percent(count: u64, total: u64, decimals: i32) -> f64 {
    round_half_even(count as f64 / total as f64 * 100.0, decimals)
}

/// Parses a distribution string back into its percentages.
/// Returns None if any entry is not a number.
pub fn parse_distribution(distribution: &str) -> Option<Vec<f64>> {
    distribution.split('-')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect()
}
