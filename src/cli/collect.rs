
use anyhow::ensure;
use chrono::NaiveDate;
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_folder, AFTER_HELP, FULL_VERSION};

#[derive(Args, Clone, Debug)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CollectSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    runstats_version: String,

    /// Folder containing one sub-folder per sequencing run
    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "run-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub run_folder: PathBuf,

    /// Folder containing the lab reports, searched recursively
    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "report-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub report_folder: PathBuf,

    /// Output statistics table (CSV/TSV)
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(value_name = "TSV")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_filename: PathBuf,

    /// Resolution cache, created if missing
    #[clap(long = "cache")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "report_cache.json")]
    pub cache_filename: PathBuf,

    /// Optional facility table overrides
    #[clap(long = "tables")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    pub tables_filename: Option<PathBuf>,

    /// Days after the run date during which a missing report is searched for again
    #[clap(long = "retry-days")]
    #[clap(value_name = "DAYS")]
    #[clap(help_heading = Some("Report resolution"))]
    #[clap(default_value = "90")]
    pub retry_days: i64,

    /// PhiX input is reported only for runs after this date
    #[clap(long = "phix-protocol-date")]
    #[clap(value_name = "YYYY-MM-DD")]
    #[clap(help_heading = Some("Statistics"))]
    #[clap(default_value = "2024-01-16")]
    pub phix_protocol_date: NaiveDate,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,

    // Debug options that are generally hidden
    /// Maximum edit distance between a flowcell ID and a report token
    #[clap(hide = true)]
    #[clap(long = "max-edit-distance")]
    #[clap(default_value = "1")]
    pub max_edit_distance: usize,
}

pub fn check_collect_settings(mut settings: CollectSettings) -> anyhow::Result<CollectSettings> {
    // hard code the version in
    settings.runstats_version = FULL_VERSION.clone();
    info!("runstats version: {:?}", &settings.runstats_version);
    info!("Sub-command: collect");
    info!("Inputs:");

    check_required_folder(&settings.run_folder, "Run folder")?;
    info!("\tRun folder: {:?}", &settings.run_folder);
    check_required_folder(&settings.report_folder, "Report folder")?;
    info!("\tReport folder: {:?}", &settings.report_folder);
    check_optional_filename(settings.tables_filename.as_deref(), "Facility tables")?;
    if let Some(tables_fn) = settings.tables_filename.as_deref() {
        info!("\tFacility tables: {tables_fn:?}");
    } else {
        info!("\tFacility tables: built-in");
    }
    info!("\tResolution cache: {:?}", &settings.cache_filename);

    info!("Outputs:");
    info!("\tStatistics table: {:?}", &settings.output_filename);

    info!("Report resolution parameters:");
    ensure!(settings.retry_days > 0, "--retry-days must be >0");
    info!("\tRetry window: {} days", settings.retry_days);
    info!("\tMax edit distance: {}", settings.max_edit_distance);

    info!("Statistics parameters:");
    info!("\tPhiX protocol date: {}", settings.phix_protocol_date);

    Ok(settings)
}
