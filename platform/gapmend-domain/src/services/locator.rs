use crate::entities::layout::DatasetLayout;
use crate::value_objects::record::Record;

/// Per (channel, column) lists of record positions holding a present value,
/// flat Vec-backed and keyed by `channel * columns + column`. Built once per
/// run; queries are read-only binary searches and safe to share across
/// workers once construction completes.
#[derive(Debug, Clone)]
pub struct ValueLocator {
    columns: usize,
    slots: Vec<Vec<usize>>,
}

impl ValueLocator {
    pub fn build(records: &[Record], layout: &DatasetLayout) -> Self {
        let columns = layout.values_per_row();
        let mut slots = vec![Vec::new(); layout.channel_count() * columns];
        for (pos, record) in records.iter().enumerate() {
            for (channel, row) in record.rows.iter().enumerate() {
                for (column, value) in row.values.iter().enumerate() {
                    if value.is_some() {
                        slots[channel * columns + column].push(pos);
                    }
                }
            }
        }
        Self { columns, slots }
    }

    fn positions(&self, channel: usize, column: usize) -> &[usize] {
        self.slots
            .get(channel * self.columns + column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Greatest indexed position `< position` holding a value, if any.
    pub fn nearest_before(&self, channel: usize, column: usize, position: usize) -> Option<usize> {
        let list = self.positions(channel, column);
        let idx = list.partition_point(|&p| p < position);
        idx.checked_sub(1).map(|i| list[i])
    }

    /// Smallest indexed position `> position` holding a value, if any.
    pub fn nearest_after(&self, channel: usize, column: usize, position: usize) -> Option<usize> {
        let list = self.positions(channel, column);
        let idx = list.partition_point(|&p| p <= position);
        list.get(idx).copied()
    }
}
