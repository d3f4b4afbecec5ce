/*!
# Stats module
Derives the per-run quality and throughput statistics from raw read counts and resolved report fields.
All percentages and ratios are rounded half-to-even at the precision the facility reports them in.
*/
/// Unknown barcode summaries and PhiX spike-in detection
pub mod barcodes;
/// Per-sample read count distribution, spread, and undetermined share
pub mod read_distribution;
/// Cluster utilization, PhiX percentages, and per-sample read requirements
pub mod run_metrics;
/// The set-once statistics record for one run
pub mod run_statistics;
