use gapmend_domain::repositories::dataset::{
    profile_records, DatasetProfile, DatasetQuery, DatasetRepository,
};
use gapmend_domain::value_objects::record::{Record, Row};
use serde::Serialize;

/// Repository adapter serving a record sequence already held in memory.
/// Window bounds from the query are applied on load; the profile is
/// recomputed for the filtered view.
#[derive(Debug, Default)]
pub struct InMemoryDatasetRepository {
    records: Vec<Record>,
}

impl InMemoryDatasetRepository {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl DatasetRepository for InMemoryDatasetRepository {
    fn load_dataset(&self, query: &DatasetQuery) -> Result<(Vec<Record>, DatasetProfile), String> {
        let records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| query.start.map(|s| r.timestamp >= s).unwrap_or(true))
            .filter(|r| query.end.map(|e| r.timestamp <= e).unwrap_or(true))
            .cloned()
            .collect();
        let profile = profile_records(&records);
        tracing::debug!(
            dataset = %query.dataset,
            records = profile.records,
            "serving in-memory dataset"
        );
        Ok((records, profile))
    }
}

/// Deterministic synthetic dataset builder: sinusoidal change values with
/// consistent cumulative registers, and whole-row gaps injected at
/// `gap_rate_bps` (per ten thousand records), never at the series edges.
#[derive(Debug, Clone, Serialize)]
pub struct SyntheticDatasetSpec {
    pub records: usize,
    pub channels: usize,
    pub change_columns: usize,
    pub start_timestamp: i64,
    pub step_seconds: i64,
    pub gap_rate_bps: u32,
}

impl Default for SyntheticDatasetSpec {
    fn default() -> Self {
        Self {
            records: 1_000,
            channels: 2,
            change_columns: 2,
            start_timestamp: 1_700_000_000,
            step_seconds: 3_600,
            gap_rate_bps: 100,
        }
    }
}

impl SyntheticDatasetSpec {
    pub fn build(&self) -> Result<Vec<Record>, String> {
        if self.records < 3 {
            return Err("records must be >= 3".to_string());
        }
        if self.channels == 0 || self.change_columns == 0 {
            return Err("channels and change_columns must be > 0".to_string());
        }
        if self.step_seconds <= 0 {
            return Err("step_seconds must be > 0".to_string());
        }
        if self.gap_rate_bps > 10_000 {
            return Err("gap_rate_bps must be <= 10000".to_string());
        }

        let mut dataset = Vec::with_capacity(self.records);
        let mut running = vec![vec![0.0f64; self.change_columns]; self.channels];
        for i in 0..self.records {
            let timestamp = self.start_timestamp + (i as i64) * self.step_seconds;
            let gapped = i > 0
                && i + 1 < self.records
                && (i as u64 * self.gap_rate_bps as u64) % 10_000 < self.gap_rate_bps as u64;

            let rows = (0..self.channels)
                .map(|ch| {
                    let mut values = Vec::with_capacity(self.change_columns * 2);
                    for col in 0..self.change_columns {
                        let phase = (i as f64) * 0.01 + (ch as f64) * 0.7 + (col as f64) * 0.3;
                        let change = 5.0 + phase.sin() * 2.0 + (phase * 3.0).cos();
                        running[ch][col] += change;
                        values.push(if gapped { None } else { Some(change) });
                    }
                    for col in 0..self.change_columns {
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
        Ok(dataset)
    }
}
