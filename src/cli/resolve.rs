
use anyhow::ensure;
use clap::Args;
use log::info;
use std::path::PathBuf;

use crate::cli::core::{check_required_folder, AFTER_HELP, FULL_VERSION};
use crate::data_types::run_id::RunIdentifier;

#[derive(Args, Clone, Debug)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct ResolveSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    runstats_version: String,

    /// Run folder name, e.g. 230515_NB501289_0712_AHGTJ5BGXY
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "run-id")]
    #[clap(value_name = "RUN")]
    #[clap(help_heading = Some("Input/Output"))]
    pub run_id: RunIdentifier,

    /// Folder containing the lab reports, searched recursively
    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "report-dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub report_folder: PathBuf,

    /// Resolution cache, created if missing
    #[clap(long = "cache")]
    #[clap(value_name = "JSON")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "report_cache.json")]
    pub cache_filename: PathBuf,

    /// Days after the run date during which a missing report is searched for again
    #[clap(long = "retry-days")]
    #[clap(value_name = "DAYS")]
    #[clap(help_heading = Some("Report resolution"))]
    #[clap(default_value = "90")]
    pub retry_days: i64,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Maximum edit distance between a flowcell ID and a report token
    #[clap(hide = true)]
    #[clap(long = "max-edit-distance")]
    #[clap(default_value = "1")]
    pub max_edit_distance: usize,
}

pub fn check_resolve_settings(mut settings: ResolveSettings) -> anyhow::Result<ResolveSettings> {
    // hard code the version in
    settings.runstats_version = FULL_VERSION.clone();
    info!("runstats version: {:?}", &settings.runstats_version);
    info!("Sub-command: resolve");
    info!("Inputs:");
    info!("\tRun: {}", settings.run_id);
    check_required_folder(&settings.report_folder, "Report folder")?;
    info!("\tReport folder: {:?}", &settings.report_folder);
    info!("\tResolution cache: {:?}", &settings.cache_filename);

    info!("Report resolution parameters:");
    ensure!(settings.retry_days > 0, "--retry-days must be >0");
    info!("\tRetry window: {} days", settings.retry_days);
    info!("\tMax edit distance: {}", settings.max_edit_distance);

    Ok(settings)
}
