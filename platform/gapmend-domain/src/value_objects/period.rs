use serde::Serialize;

/// A maximal contiguous span of timestamps over which the same set of
/// channels lacks at least one change value. `start_time`/`end_time` are the
/// last known timestamp before and the first known timestamp after the span;
/// `None` means the gap touches that edge of the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingPeriod {
    pub missing_timestamps: Vec<i64>,
    pub channels: Vec<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl MissingPeriod {
    pub fn first_missing(&self) -> Option<i64> {
        self.missing_timestamps.first().copied()
    }

    pub fn last_missing(&self) -> Option<i64> {
        self.missing_timestamps.last().copied()
    }
}

/// A valid neighbor of an unresolved cell: the record position holding the
/// value and the value itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointNeighbor {
    pub position: usize,
    pub value: f64,
}

/// One unresolved change cell, queued for filling. Transient: built and
/// discarded within a single engine run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissingDataPoint {
    pub channel: usize,
    pub column: usize,
    pub timestamp: i64,
    pub position: usize,
    pub previous: PointNeighbor,
    pub next: PointNeighbor,
    pub base_estimate: f64,
}
