mod calculator;
mod reconcile;

use crate::entities::layout::DatasetLayout;
use crate::entities::stats::{MissingProcessingStats, StatsCollector};
use crate::services::cache::FillCache;
use crate::services::detector::detect_missing_periods;
use crate::services::locator::ValueLocator;
use crate::services::time_index::TimeIndex;
use crate::services::value_math::ValueMath;
use crate::value_objects::period::MissingPeriod;
use crate::value_objects::record::Record;
use calculator::{resolve_change_cell, PointOutcome, ResolveContext};
use reconcile::{reconcile_cumulative, ResolvedCumulatives};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

/// Interpolation-adjustment policy applied to the base midpoint estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// Unweighted average of the bounding neighbors.
    Midpoint,
    /// Linear interpolation weighted by the point's position within the
    /// bounded period.
    Weighted,
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::Weighted
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Override for the change-column count; default is half the row's
    /// value-sequence length.
    pub change_columns_per_row: Option<usize>,
    pub policy: FillPolicy,
    /// Fan columns of one (channel, timestamp) out across workers.
    pub parallel_value_columns: bool,
    /// Worker cap for the column fanout; default is the column count.
    pub workers: Option<usize>,
    pub cache_capacity: usize,
    pub cache_ttl: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            change_columns_per_row: None,
            policy: FillPolicy::default(),
            parallel_value_columns: false,
            workers: None,
            cache_capacity: 4096,
            cache_ttl: None,
        }
    }
}

/// Progress snapshot emitted before the first period and after each period.
#[derive(Debug, Clone)]
pub struct RepairProgress {
    pub total_periods: usize,
    pub completed_periods: usize,
    pub fills: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub last_period_start: Option<i64>,
}

/// The gap-fill reconciliation engine. Owns the memoization cache (which is
/// how repeated passes over the same dataset become warm) and borrows its
/// math collaborator and optional log sink.
///
/// A run has three strictly ordered phases: indexing (time index + locator),
/// detecting (period enumeration) and filling (per-period resolution).
/// Periods are filled in chronological order because later periods may chain
/// off cumulative values resolved in earlier ones.
pub struct RepairEngine<'a> {
    options: EngineOptions,
    math: &'a dyn ValueMath,
    cache: FillCache,
    log: Option<&'a (dyn Fn(&str) + Sync)>,
}

impl<'a> RepairEngine<'a> {
    pub fn new(options: EngineOptions, math: &'a dyn ValueMath) -> Self {
        let cache = FillCache::new(options.cache_capacity, options.cache_ttl);
        Self {
            options,
            math,
            cache,
            log: None,
        }
    }

    pub fn with_log(mut self, log: &'a (dyn Fn(&str) + Sync)) -> Self {
        self.log = Some(log);
        self
    }

    fn log_line(&self, line: &str) {
        if let Some(log) = self.log {
            log(line);
        }
    }

    /// Enumerates the missing periods the next run would repair, without
    /// mutating anything.
    pub fn detect(&self, records: &[Record]) -> Result<Vec<MissingPeriod>, String> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let layout = DatasetLayout::resolve(records, self.options.change_columns_per_row)?;
        let index = TimeIndex::build(records);
        Ok(detect_missing_periods(records, &index, &layout))
    }

    pub fn run(&self, records: &mut [Record]) -> Result<MissingProcessingStats, String> {
        self.run_with_hooks(records, None, None)
    }

    pub fn run_with_hooks(
        &self,
        records: &mut [Record],
        mut on_progress: Option<&mut dyn FnMut(RepairProgress)>,
        should_cancel: Option<&(dyn Fn() -> bool + Sync)>,
    ) -> Result<MissingProcessingStats, String> {
        if records.is_empty() {
            return Ok(MissingProcessingStats::default());
        }

        // INDEXING: structural errors fail here, before any cell is touched.
        let layout = DatasetLayout::resolve(records, self.options.change_columns_per_row)?;
        let index = TimeIndex::build(records);
        let locator = ValueLocator::build(records, &layout);

        // DETECTING
        let periods = detect_missing_periods(records, &index, &layout);
        self.log_line(&format!(
            "detected {} missing period(s) across {} records / {} channels",
            periods.len(),
            records.len(),
            layout.channel_count()
        ));

        // FILLING
        let stats = StatsCollector::new();
        let mut resolved = ResolvedCumulatives::new(&layout);
        emit_progress(&mut on_progress, &stats, periods.len(), 0, None);

        for (completed, period) in periods.iter().enumerate() {
            if should_cancelled(should_cancel) {
                return Err("cancelled".to_string());
            }

            let channels: Vec<usize> = period
                .channels
                .iter()
                .filter_map(|name| layout.channel_index(name))
                .collect();

            for &timestamp in &period.missing_timestamps {
                let Some(position) = index.position(timestamp) else {
                    // Index/lookup inconsistency: unresolvable for this
                    // timestamp, counted and skipped. Only cells that are
                    // actually absent count as misses.
                    self.log_line(&format!(
                        "timestamp {} referenced by a period but absent from the time index; skipping",
                        timestamp
                    ));
                    let misses = records
                        .iter()
                        .find(|record| record.timestamp == timestamp)
                        .map(|record| {
                            absent_change_cells(record, &channels, layout.change_columns())
                        })
                        .unwrap_or(channels.len() * layout.change_columns());
                    for _ in 0..misses {
                        stats.record_cache_miss();
                    }
                    continue;
                };

                for &channel in &channels {
                    let absent: Vec<usize> = (0..layout.change_columns())
                        .filter(|&column| records[position].cell(channel, column).is_none())
                        .collect();
                    if absent.is_empty() {
                        continue;
                    }
                    let Some(channel_name) = layout.channel_name(channel) else {
                        continue;
                    };

                    let outcomes = {
                        let ctx = ResolveContext {
                            records: &*records,
                            locator: &locator,
                            cache: &self.cache,
                            stats: &stats,
                            math: self.math,
                            policy: self.options.policy,
                        };
                        if self.options.parallel_value_columns && absent.len() > 1 {
                            let workers = self.options.workers.unwrap_or(absent.len());
                            resolve_columns_parallel(
                                &ctx,
                                channel,
                                channel_name,
                                timestamp,
                                position,
                                &absent,
                                workers,
                            )
                        } else {
                            absent
                                .iter()
                                .map(|&column| {
                                    resolve_change_cell(
                                        &ctx,
                                        channel,
                                        channel_name,
                                        column,
                                        timestamp,
                                        position,
                                    )
                                })
                                .collect()
                        }
                    };

                    // All writes happen here, on the coordinating thread,
                    // after the fanout has joined.
                    for outcome in outcomes {
                        let Some(value) = outcome.value else {
                            continue;
                        };
                        records[position].set_cell(channel, outcome.column, value);
                        stats.record_fill();
                        reconcile_cumulative(
                            records,
                            &layout,
                            &locator,
                            &mut resolved,
                            self.math,
                            channel,
                            outcome.column,
                            position,
                            value,
                        );
                    }
                }
            }

            emit_progress(
                &mut on_progress,
                &stats,
                periods.len(),
                completed + 1,
                period.start_time,
            );
        }

        let snapshot = stats.snapshot();
        self.log_line(&format!(
            "run complete: {} fill(s), {} cache hit(s), {} cache miss(es)",
            snapshot.fills, snapshot.cache_hits, snapshot.cache_misses
        ));
        Ok(snapshot)
    }
}

/// Bounded column fanout for one (channel, timestamp): scoped workers pull
/// column indices off a shared atomic counter and stream outcomes back over
/// a channel. Outcomes are re-sorted by column so the write order stays
/// deterministic.
fn resolve_columns_parallel(
    ctx: &ResolveContext<'_>,
    channel: usize,
    channel_name: &str,
    timestamp: i64,
    position: usize,
    columns: &[usize],
    workers: usize,
) -> Vec<PointOutcome> {
    let worker_count = workers.max(1).min(columns.len());
    let next_index = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<PointOutcome>();

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let tx = tx.clone();
            let next_index_ref = &next_index;
            scope.spawn(move || loop {
                let idx = next_index_ref.fetch_add(1, Ordering::Relaxed);
                if idx >= columns.len() {
                    break;
                }
                let outcome = resolve_change_cell(
                    ctx,
                    channel,
                    channel_name,
                    columns[idx],
                    timestamp,
                    position,
                );
                if tx.send(outcome).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut outcomes: Vec<PointOutcome> = rx.iter().collect();
        outcomes.sort_by_key(|outcome| outcome.column);
        outcomes
    })
}

fn absent_change_cells(record: &Record, channels: &[usize], change_columns: usize) -> usize {
    channels
        .iter()
        .map(|&channel| {
            (0..change_columns)
                .filter(|&column| record.cell(channel, column).is_none())
                .count()
        })
        .sum()
}

fn should_cancelled(should_cancel: Option<&(dyn Fn() -> bool + Sync)>) -> bool {
    should_cancel.map(|f| f()).unwrap_or(false)
}

fn emit_progress(
    on_progress: &mut Option<&mut dyn FnMut(RepairProgress)>,
    stats: &StatsCollector,
    total_periods: usize,
    completed_periods: usize,
    last_period_start: Option<i64>,
) {
    if let Some(callback) = on_progress.as_mut() {
        let snapshot = stats.snapshot();
        (callback)(RepairProgress {
            total_periods,
            completed_periods,
            fills: snapshot.fills,
            cache_hits: snapshot.cache_hits,
            cache_misses: snapshot.cache_misses,
            last_period_start,
        });
    }
}
