use crate::value_objects::record::Record;
use std::collections::HashMap;

/// Structural shape of a dataset, resolved once per run: the channel names in
/// dataset order (with a dense index per name), the uniform value-sequence
/// length, and the number of change columns per row. Resolution is where
/// structural configuration errors fail the run, before any cell is touched.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    channels: Vec<String>,
    channel_index: HashMap<String, usize>,
    values_per_row: usize,
    change_columns: usize,
}

impl DatasetLayout {
    pub fn resolve(
        records: &[Record],
        change_columns_override: Option<usize>,
    ) -> Result<Self, String> {
        let first = records
            .first()
            .ok_or_else(|| "cannot resolve layout of an empty dataset".to_string())?;
        if first.rows.is_empty() {
            return Err("records must carry at least one channel".to_string());
        }

        let channels: Vec<String> = first.rows.iter().map(|row| row.channel.clone()).collect();
        let values_per_row = first.rows[0].values.len();
        if values_per_row < 2 {
            return Err(format!(
                "rows must carry at least 2 value columns (one change/cumulative pair), got {}",
                values_per_row
            ));
        }

        for record in records {
            if record.rows.len() != channels.len() {
                return Err(format!(
                    "inconsistent channel count at timestamp {}: expected {}, got {}",
                    record.timestamp,
                    channels.len(),
                    record.rows.len()
                ));
            }
            for (idx, row) in record.rows.iter().enumerate() {
                if row.channel != channels[idx] {
                    return Err(format!(
                        "channel order mismatch at timestamp {}: expected '{}' at index {}, got '{}'",
                        record.timestamp, channels[idx], idx, row.channel
                    ));
                }
                if row.values.len() != values_per_row {
                    return Err(format!(
                        "inconsistent value-sequence length for channel '{}' at timestamp {}: expected {}, got {}",
                        row.channel,
                        record.timestamp,
                        values_per_row,
                        row.values.len()
                    ));
                }
            }
        }

        let change_columns = match change_columns_override {
            Some(0) => return Err("change_columns_per_row must be > 0".to_string()),
            Some(n) => n,
            None => values_per_row / 2,
        };
        if change_columns == 0 {
            return Err("change_columns_per_row resolved to 0".to_string());
        }
        if change_columns * 2 > values_per_row {
            return Err(format!(
                "change_columns_per_row ({}) leaves no paired cumulative columns in rows of {} values",
                change_columns, values_per_row
            ));
        }

        let channel_index = channels
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();

        Ok(Self {
            channels,
            channel_index,
            values_per_row,
            change_columns,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_name(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(String::as_str)
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_index.get(name).copied()
    }

    pub fn values_per_row(&self) -> usize {
        self.values_per_row
    }

    pub fn change_columns(&self) -> usize {
        self.change_columns
    }

    /// Index of the cumulative column paired with a change column.
    pub fn cumulative_column(&self, change_column: usize) -> usize {
        change_column + self.change_columns
    }
}
