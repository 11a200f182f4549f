use crate::entities::layout::DatasetLayout;
use crate::services::locator::ValueLocator;
use crate::services::value_math::ValueMath;
use crate::value_objects::record::Record;

/// Per-run tracker of cumulative cells resolved earlier in the same run,
/// keyed by (channel, change column). The static locator only knows values
/// present before the run started; this is what lets a cumulative fill at T2
/// feed the reconciliation at T3 inside the same period.
#[derive(Debug)]
pub(crate) struct ResolvedCumulatives {
    change_columns: usize,
    last: Vec<Option<usize>>,
}

impl ResolvedCumulatives {
    pub fn new(layout: &DatasetLayout) -> Self {
        Self {
            change_columns: layout.change_columns(),
            last: vec![None; layout.channel_count() * layout.change_columns()],
        }
    }

    fn slot(&self, channel: usize, change_column: usize) -> usize {
        channel * self.change_columns + change_column
    }

    pub fn last_filled(&self, channel: usize, change_column: usize) -> Option<usize> {
        self.last.get(self.slot(channel, change_column)).copied().flatten()
    }

    pub fn record(&mut self, channel: usize, change_column: usize, position: usize) {
        let slot = self.slot(channel, change_column);
        if let Some(entry) = self.last.get_mut(slot) {
            *entry = Some(position);
        }
    }
}

/// Derives the paired cumulative cell from a freshly filled change value:
/// `new = previous_resolved_cumulative + change`. Runs only when the
/// cumulative cell at the same timestamp is absent; with no earlier resolved
/// cumulative value the cell stays absent, a baseline is never fabricated.
pub(crate) fn reconcile_cumulative(
    records: &mut [Record],
    layout: &DatasetLayout,
    locator: &ValueLocator,
    resolved: &mut ResolvedCumulatives,
    math: &dyn ValueMath,
    channel: usize,
    change_column: usize,
    position: usize,
    change_value: f64,
) {
    let cumulative_column = layout.cumulative_column(change_column);
    let Some(record) = records.get(position) else {
        return;
    };
    if record.cell(channel, cumulative_column).is_some() {
        return;
    }

    let known = locator.nearest_before(channel, cumulative_column, position);
    let filled = resolved
        .last_filled(channel, change_column)
        .filter(|&p| p < position);
    let previous_position = match (known, filled) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    let Some(previous_position) = previous_position else {
        return;
    };
    let Some(previous_value) = records
        .get(previous_position)
        .and_then(|r| r.cell(channel, cumulative_column))
    else {
        return;
    };

    let value = math.round(previous_value + change_value);
    records[position].set_cell(channel, cumulative_column, value);
    resolved.record(channel, change_column, position);
}
