use crate::config::Config;
use crate::shared::{
    resolve_engine_options, resolve_round_decimals, resolve_window, summary_json,
};
use gapmend_domain::entities::stats::MissingProcessingStats;
use gapmend_domain::repositories::dataset::{DatasetQuery, DatasetRepository};
use gapmend_domain::repositories::reports::ReportWriter;
use gapmend_domain::services::fill::RepairEngine;
use gapmend_domain::services::value_math::StandardValueMath;
use gapmend_domain::value_objects::period::MissingPeriod;
use gapmend_domain::value_objects::record::Record;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info_span;

#[derive(Debug)]
pub struct RepairOutcome {
    pub run_dir: PathBuf,
    pub stats: MissingProcessingStats,
    pub periods: Vec<MissingPeriod>,
    pub records: Vec<Record>,
}

/// Loads the dataset through the repository port, repairs it in place, emits
/// run metrics and writes the summary/periods/config artifacts under
/// `<out_dir>/<run_id>/`.
pub fn run_repair(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    dataset_repo: &dyn DatasetRepository,
    reports: &dyn ReportWriter,
) -> Result<RepairOutcome, String> {
    let _span = info_span!(
        "run_repair",
        run_id = %config.run.run_id,
        dataset = %config.run.dataset
    )
    .entered();

    let (start, end) = resolve_window(config)?;
    let stage_start = Instant::now();
    let (mut records, profile) = dataset_repo.load_dataset(&DatasetQuery {
        dataset: config.run.dataset.clone(),
        start,
        end,
    })?;
    metrics::histogram!("gapmend.repair.load_dataset_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    tracing::info!(
        records = profile.records,
        channels = profile.channels,
        absent_cells = profile.absent_cells,
        "dataset loaded"
    );

    let options = resolve_engine_options(config)?;
    let math = StandardValueMath::new(resolve_round_decimals(config));
    let forward = |line: &str| tracing::info!(target: "gapmend::engine", "{line}");
    let engine = RepairEngine::new(options, &math).with_log(&forward);

    // Periods are enumerated on the pre-repair state for the report.
    let periods = engine.detect(&records)?;

    let stage_start = Instant::now();
    let stats = engine.run(&mut records)?;
    let engine_ms = stage_start.elapsed().as_millis() as u64;
    metrics::histogram!("gapmend.repair.engine_ms").record(engine_ms as f64);
    metrics::counter!("gapmend.repair.fills").increment(stats.fills);
    metrics::counter!("gapmend.repair.cache_hits").increment(stats.cache_hits);
    metrics::counter!("gapmend.repair.cache_misses").increment(stats.cache_misses);
    metrics::gauge!("gapmend.repair.periods").set(periods.len() as f64);

    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.run.out_dir));
    let run_dir = base_dir.join(&config.run.run_id);
    reports.ensure_dir(&run_dir)?;
    let summary = summary_json(config, &profile, &stats, periods.len(), engine_ms);
    reports.write_summary_json(run_dir.join("summary.json").as_path(), &summary)?;
    reports.write_periods_csv(run_dir.join("periods.csv").as_path(), &periods)?;
    reports.write_config_snapshot_toml(
        run_dir.join("config_snapshot.toml").as_path(),
        config_toml,
    )?;

    Ok(RepairOutcome {
        run_dir,
        stats,
        periods,
        records,
    })
}
