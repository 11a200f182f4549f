use serde::{Deserialize, Serialize};

/// One channel's readings at a single timestamp. The first N columns hold
/// change values, the next N the paired cumulative registers; absent cells
/// are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub channel: String,
    pub values: Vec<Option<f64>>,
}

impl Row {
    pub fn cell(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn set_cell(&mut self, column: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(column) {
            *slot = Some(value);
        }
    }
}

/// One reporting instant: an epoch-seconds timestamp (date + hour upstream)
/// and the rows of every monitored channel, in dataset channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: i64,
    pub rows: Vec<Row>,
}

impl Record {
    pub fn cell(&self, channel: usize, column: usize) -> Option<f64> {
        self.rows.get(channel)?.cell(column)
    }

    pub fn set_cell(&mut self, channel: usize, column: usize, value: f64) {
        if let Some(row) = self.rows.get_mut(channel) {
            row.set_cell(column, value);
        }
    }
}
