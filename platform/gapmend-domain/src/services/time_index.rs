use crate::value_objects::record::Record;
use std::collections::HashMap;

/// Maps each record's timestamp to its position in the series. Built in a
/// single pass; when duplicate timestamps occur the first occurrence wins and
/// later duplicates are silently not indexed.
#[derive(Debug, Default, Clone)]
pub struct TimeIndex {
    positions: HashMap<i64, usize>,
    stamps: Vec<i64>,
}

impl TimeIndex {
    pub fn build(records: &[Record]) -> Self {
        let mut positions = HashMap::with_capacity(records.len());
        let mut stamps = Vec::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            positions.entry(record.timestamp).or_insert(pos);
            stamps.push(record.timestamp);
        }
        Self { positions, stamps }
    }

    pub fn position(&self, timestamp: i64) -> Option<usize> {
        self.positions.get(&timestamp).copied()
    }

    pub fn stamp_at(&self, position: usize) -> Option<i64> {
        self.stamps.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}
