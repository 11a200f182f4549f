use crate::shared::parse_fill_policy;
use gapmend_domain::entities::stats::MissingProcessingStats;
use gapmend_domain::services::fill::{EngineOptions, RepairEngine};
pub use gapmend_domain::services::fill::FillPolicy;
use gapmend_domain::services::value_math::StandardValueMath;
use gapmend_domain::value_objects::record::{Record, Row};
use std::time::Instant;

pub struct BenchSummary {
    pub policy: FillPolicy,
    pub parallel: bool,
    pub records_requested: usize,
    pub channels: usize,
    pub change_columns: usize,
    pub missing_cells: usize,
    pub stats: MissingProcessingStats,
    pub elapsed_ms: u64,
    pub records_per_sec: f64,
    pub fills_per_sec: f64,
}

/// Deterministic synthetic repair benchmark: sinusoidal change series with
/// whole-row gaps injected at the requested rate, then a timed engine run.
pub fn run_bench(
    records: usize,
    channels: usize,
    change_columns: usize,
    gap_rate_bps: u32,
    policy: &str,
    parallel: bool,
) -> Result<BenchSummary, String> {
    if records < 3 {
        return Err("records must be >= 3".to_string());
    }
    if channels == 0 {
        return Err("channels must be > 0".to_string());
    }
    if change_columns == 0 {
        return Err("change_columns must be > 0".to_string());
    }
    if gap_rate_bps > 10_000 {
        return Err("gap_rate_bps must be <= 10000".to_string());
    }
    let policy = parse_fill_policy(policy)?;

    let mut dataset = synthesize(records, channels, change_columns, gap_rate_bps);
    let missing_cells = dataset
        .iter()
        .flat_map(|record| &record.rows)
        .map(|row| row.values[..change_columns]
            .iter()
            .filter(|value| value.is_none())
            .count())
        .sum();

    let math = StandardValueMath::default();
    let engine = RepairEngine::new(
        EngineOptions {
            policy,
            parallel_value_columns: parallel,
            ..EngineOptions::default()
        },
        &math,
    );

    let start = Instant::now();
    let stats = engine.run(&mut dataset)?;
    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    let per_sec = |count: f64| {
        if elapsed.as_secs_f64() > 0.0 {
            count / elapsed.as_secs_f64()
        } else {
            0.0
        }
    };

    Ok(BenchSummary {
        policy,
        parallel,
        records_requested: records,
        channels,
        change_columns,
        missing_cells,
        stats,
        elapsed_ms,
        records_per_sec: per_sec(records as f64),
        fills_per_sec: per_sec(stats.fills as f64),
    })
}

fn synthesize(
    records: usize,
    channels: usize,
    change_columns: usize,
    gap_rate_bps: u32,
) -> Vec<Record> {
    let start_ts = 1_700_000_000i64;
    let step = 3_600i64;
    let mut dataset = Vec::with_capacity(records);
    let mut running: Vec<Vec<f64>> = vec![vec![0.0; change_columns]; channels];

    for i in 0..records {
        let timestamp = start_ts + (i as i64) * step;
        // Whole-row gaps, never at the series edges so every gap is bounded.
        let gapped = i > 0
            && i + 1 < records
            && (i as u64 * gap_rate_bps as u64) % 10_000 < gap_rate_bps as u64;

        let rows = (0..channels)
            .map(|ch| {
                let mut values = Vec::with_capacity(change_columns * 2);
                for col in 0..change_columns {
                    let phase = (i as f64) * 0.01 + (ch as f64) * 0.7 + (col as f64) * 0.3;
                    let change = 5.0 + phase.sin() * 2.0 + (phase * 3.0).cos();
                    running[ch][col] += change;
                    values.push(if gapped { None } else { Some(change) });
                }
                for col in 0..change_columns {
                    values.push(if gapped { None } else { Some(running[ch][col]) });
                }
                Row {
                    channel: format!("CH{ch:02}"),
                    values,
                }
            })
            .collect();
        dataset.push(Record { timestamp, rows });
    }
    dataset
}
