use crate::value_objects::record::Record;
use serde::Serialize;

/// Query handed to the file-reading collaborator. `start`/`end` are
/// inclusive epoch-second bounds; `None` leaves that side open.
#[derive(Debug, Clone)]
pub struct DatasetQuery {
    pub dataset: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Shape summary of a loaded dataset, reported alongside the records.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DatasetProfile {
    pub records: usize,
    pub channels: usize,
    pub value_columns: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub absent_cells: usize,
}

/// Single-pass profile of a record sequence.
pub fn profile_records(records: &[Record]) -> DatasetProfile {
    let mut profile = DatasetProfile {
        records: records.len(),
        ..DatasetProfile::default()
    };
    let Some(first) = records.first() else {
        return profile;
    };
    profile.channels = first.rows.len();
    profile.value_columns = first.rows.first().map(|row| row.values.len()).unwrap_or(0);
    profile.first_timestamp = Some(first.timestamp);
    profile.last_timestamp = records.last().map(|record| record.timestamp);
    for record in records {
        for row in &record.rows {
            profile.absent_cells += row.values.iter().filter(|value| value.is_none()).count();
        }
    }
    profile
}

/// Port for the upstream collaborator that materializes records (spreadsheet
/// parsing lives behind this boundary).
pub trait DatasetRepository {
    fn load_dataset(&self, query: &DatasetQuery) -> Result<(Vec<Record>, DatasetProfile), String>;
}
