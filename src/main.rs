
use log::{LevelFilter, error, info, warn};
use std::time::Instant;

use runstats::cli::collect::{CollectSettings, check_collect_settings};
use runstats::cli::core::{Commands, get_cli};
use runstats::cli::resolve::{ResolveSettings, check_resolve_settings};
use runstats::data_types::facility_tables::FacilityTables;
use runstats::pipeline::{PipelineConfig, PipelineConfigBuilder, RunCollector, build_resolver};
use runstats::resolution::resolver::ResolutionOutcome;
use runstats::writers::statistics_table::write_statistics_table;

fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

fn build_pipeline_config(builder: &mut PipelineConfigBuilder) -> PipelineConfig {
    match builder.build() {
        Ok(pc) => pc,
        Err(e) => {
            error!("Error while building pipeline config: {e:?}");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn run_collect(settings: CollectSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);
    let settings = match check_collect_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let tables = match settings.tables_filename.as_deref() {
        Some(tables_fn) => {
            info!("Loading facility tables from {tables_fn:?}...");
            match FacilityTables::from_json(tables_fn) {
                Ok(t) => t,
                Err(e) => {
                    error!("Error while loading facility tables: {e:#}");
                    std::process::exit(exitcode::CONFIG);
                }
            }
        },
        None => FacilityTables::default()
    };

    let pipeline_config = build_pipeline_config(
        PipelineConfigBuilder::default()
            .phix_protocol_date(settings.phix_protocol_date)
            .retry_days(settings.retry_days)
            .max_edit_distance(settings.max_edit_distance)
    );
    let resolver = match build_resolver(&settings.report_folder, &settings.cache_filename, &pipeline_config) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while building report resolver: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    info!("Collecting run statistics...");
    let mut collector = RunCollector::new(resolver, tables, pipeline_config);
    let records = match collector.collect_all(&settings.run_folder) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while collecting runs: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let num_found = records.iter().filter(|r| r.report_found()).count();
    info!("Reports found for {num_found} / {} runs.", records.len());

    info!("Saving statistics table to {:?}...", settings.output_filename);
    if let Err(e) = write_statistics_table(&settings.output_filename, &records) {
        error!("Error while writing statistics table: {e}");
        std::process::exit(exitcode::IOERR);
    }

    info!("Collection completed in {} seconds.", start_time.elapsed().as_secs_f64());
}

fn run_resolve(settings: ResolveSettings) {
    init_logging(settings.verbosity);
    let settings = match check_resolve_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let pipeline_config = build_pipeline_config(
        PipelineConfigBuilder::default()
            .retry_days(settings.retry_days)
            .max_edit_distance(settings.max_edit_distance)
    );
    let mut resolver = match build_resolver(&settings.report_folder, &settings.cache_filename, &pipeline_config) {
        Ok(r) => r,
        Err(e) => {
            error!("Error while building report resolver: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let outcome = resolver.resolve(&settings.run_id);
    match &outcome {
        ResolutionOutcome::Cached(path) |
        ResolutionOutcome::Matched(path) => {
            info!("Report for {} ({}): {path:?}", settings.run_id, outcome.as_ref());
            println!("{}", path.display());
        },
        ResolutionOutcome::NotFound => {
            warn!("No report found for {}", settings.run_id);
        },
        ResolutionOutcome::Expired => {
            warn!("No report found for {} and the retry window has passed", settings.run_id);
        }
    };
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Collect(settings) => {
            run_collect(*settings);
        },
        Commands::Resolve(settings) => {
            run_resolve(*settings);
        }
    }

    info!("Process finished successfully.");
}
