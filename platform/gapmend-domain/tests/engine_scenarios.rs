use gapmend_domain::services::fill::{EngineOptions, FillPolicy, RepairEngine};
use gapmend_domain::services::value_math::{StandardValueMath, ValueMath};
use gapmend_domain::value_objects::record::{Record, Row};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn single_channel(changes: &[Option<f64>], cumulatives: &[Option<f64>]) -> Vec<Record> {
    assert_eq!(changes.len(), cumulatives.len());
    changes
        .iter()
        .zip(cumulatives)
        .enumerate()
        .map(|(idx, (change, cumulative))| Record {
            timestamp: 60 * (idx as i64 + 1),
            rows: vec![Row {
                channel: "A".to_string(),
                values: vec![*change, *cumulative],
            }],
        })
        .collect()
}

fn spec_scenario() -> Vec<Record> {
    // T1..T5, one change column: [10, null, null, 40, 50]; cumulative known
    // at T1 only.
    single_channel(
        &[Some(10.0), None, None, Some(40.0), Some(50.0)],
        &[Some(100.0), None, None, None, None],
    )
}

fn options(policy: FillPolicy) -> EngineOptions {
    EngineOptions {
        policy,
        ..EngineOptions::default()
    }
}

#[test]
fn midpoint_policy_fills_the_flat_average() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Midpoint), &math);
    let mut records = spec_scenario();

    let periods = engine.detect(&records).expect("detect");
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0].missing_timestamps, vec![120, 180]);
    assert_eq!(periods[0].start_time, Some(60));
    assert_eq!(periods[0].end_time, Some(240));

    let stats = engine.run(&mut records).expect("run");
    assert_eq!(stats.fills, 2);
    assert_eq!(records[1].cell(0, 0), Some(25.0));
    assert_eq!(records[2].cell(0, 0), Some(25.0));
}

#[test]
fn weighted_policy_interpolates_across_the_period() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut records = spec_scenario();

    engine.run(&mut records).expect("run");
    assert_eq!(records[1].cell(0, 0), Some(20.0));
    assert_eq!(records[2].cell(0, 0), Some(30.0));
}

#[test]
fn cumulative_registers_accumulate_from_the_nearest_resolved_value() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut records = spec_scenario();

    engine.run(&mut records).expect("run");
    assert_eq!(records[1].cell(0, 1), Some(120.0));
    assert_eq!(records[2].cell(0, 1), Some(150.0));
    // Reconciliation only follows change fills; T4's cumulative was absent
    // but its change was known, so it stays absent.
    assert_eq!(records[3].cell(0, 1), None);
}

#[test]
fn second_run_over_repaired_records_fills_nothing() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut records = spec_scenario();

    let first = engine.run(&mut records).expect("first run");
    assert_eq!(first.fills, 2);
    let repaired = records.clone();

    let second = engine.run(&mut records).expect("second run");
    assert_eq!(second.fills, 0);
    assert_eq!(records, repaired);
}

#[test]
fn warm_cache_reproduces_cold_fill_values_bit_for_bit() {
    let math = StandardValueMath::default();

    let cold_engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut cold_records = spec_scenario();
    let cold_stats = cold_engine.run(&mut cold_records).expect("cold run");
    assert_eq!(cold_stats.cache_hits, 0);

    // Same engine, fresh copy of the broken dataset: the cache is warm now.
    let mut warm_records = spec_scenario();
    let warm_stats = cold_engine.run(&mut warm_records).expect("warm run");

    assert_eq!(warm_stats.fills, cold_stats.fills);
    assert_eq!(warm_stats.cache_hits, 2);
    assert_eq!(warm_records, cold_records);
}

#[test]
fn unresolvable_edge_gaps_count_misses_without_filling() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut records = single_channel(
        &[None, None, Some(30.0), None],
        &[None, None, Some(300.0), None],
    );

    let stats = engine.run(&mut records).expect("run");
    assert_eq!(stats.fills, 0);
    assert_eq!(stats.cache_misses, 3);
    assert_eq!(records[0].cell(0, 0), None);
    assert_eq!(records[3].cell(0, 0), None);
}

#[test]
fn channels_with_distinct_spans_are_repaired_independently() {
    let rows = |a: Option<f64>, b: Option<f64>| {
        vec![
            Row {
                channel: "A".to_string(),
                values: vec![a, None],
            },
            Row {
                channel: "B".to_string(),
                values: vec![b, None],
            },
        ]
    };
    let mut records = vec![
        Record { timestamp: 60, rows: rows(Some(10.0), Some(100.0)) },
        Record { timestamp: 120, rows: rows(None, Some(200.0)) },
        Record { timestamp: 180, rows: rows(Some(30.0), None) },
        Record { timestamp: 240, rows: rows(Some(40.0), Some(400.0)) },
    ];

    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Midpoint), &math);
    let periods = engine.detect(&records).expect("detect");
    assert_eq!(periods.len(), 2);

    let stats = engine.run(&mut records).expect("run");
    assert_eq!(stats.fills, 2);
    assert_eq!(records[1].cell(0, 0), Some(20.0));
    assert_eq!(records[2].cell(1, 0), Some(300.0));
}

/// ValueMath wrapper that tracks how many averages run concurrently, the
/// same max-active-atomics observation used for the fanout elsewhere in the
/// workspace tests.
struct InstrumentedMath {
    inner: StandardValueMath,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl InstrumentedMath {
    fn new() -> Self {
        Self {
            inner: StandardValueMath::default(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl ValueMath for InstrumentedMath {
    fn average(&self, a: f64, b: f64) -> f64 {
        let current = self.active.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_active.fetch_max(current, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(25));
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.inner.average(a, b)
    }

    fn round(&self, value: f64) -> f64 {
        self.inner.round(value)
    }

    fn clamp(&self, value: f64, low: f64, high: f64) -> f64 {
        self.inner.clamp(value, low, high)
    }
}

fn multi_column_scenario() -> Vec<Record> {
    // One channel, three change columns + three cumulative registers; every
    // change column is absent at the middle timestamp.
    let row = |values: Vec<Option<f64>>| {
        vec![Row {
            channel: "A".to_string(),
            values,
        }]
    };
    vec![
        Record {
            timestamp: 60,
            rows: row(vec![
                Some(10.0),
                Some(20.0),
                Some(30.0),
                Some(100.0),
                Some(200.0),
                Some(300.0),
            ]),
        },
        Record {
            timestamp: 120,
            rows: row(vec![None, None, None, None, None, None]),
        },
        Record {
            timestamp: 180,
            rows: row(vec![
                Some(30.0),
                Some(40.0),
                Some(50.0),
                Some(160.0),
                Some(260.0),
                Some(380.0),
            ]),
        },
    ]
}

#[test]
fn parallel_columns_overlap_and_match_the_serial_result() {
    let serial_math = StandardValueMath::default();
    let serial_engine = RepairEngine::new(options(FillPolicy::Weighted), &serial_math);
    let mut serial_records = multi_column_scenario();
    let serial_stats = serial_engine.run(&mut serial_records).expect("serial run");

    let math = InstrumentedMath::new();
    let engine = RepairEngine::new(
        EngineOptions {
            policy: FillPolicy::Weighted,
            parallel_value_columns: true,
            workers: Some(3),
            ..EngineOptions::default()
        },
        &math,
    );
    let mut parallel_records = multi_column_scenario();
    let parallel_stats = engine.run(&mut parallel_records).expect("parallel run");

    assert_eq!(parallel_records, serial_records);
    assert_eq!(parallel_stats, serial_stats);
    assert!(
        math.max_active.load(Ordering::Relaxed) > 1,
        "column fanout should overlap value computations"
    );
}

#[test]
fn whole_row_gap_reconciles_every_cumulative_register() {
    let math = StandardValueMath::default();
    let engine = RepairEngine::new(options(FillPolicy::Weighted), &math);
    let mut records = multi_column_scenario();

    let stats = engine.run(&mut records).expect("run");
    assert_eq!(stats.fills, 3);
    assert_eq!(records[1].cell(0, 0), Some(20.0));
    assert_eq!(records[1].cell(0, 1), Some(30.0));
    assert_eq!(records[1].cell(0, 2), Some(40.0));
    // cumulative[t] = cumulative[prev] + filled change
    assert_eq!(records[1].cell(0, 3), Some(120.0));
    assert_eq!(records[1].cell(0, 4), Some(230.0));
    assert_eq!(records[1].cell(0, 5), Some(340.0));
}
