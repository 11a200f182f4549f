use crate::entities::stats::StatsCollector;
use crate::services::cache::{FillCache, FillCacheKey};
use crate::services::locator::ValueLocator;
use crate::services::value_math::ValueMath;
use crate::value_objects::period::{MissingDataPoint, PointNeighbor};
use crate::value_objects::record::Record;
use super::FillPolicy;

/// Shared read-only state for resolving the change cells of one run. Safe to
/// share across column workers: records and locator are immutable here, the
/// cache guards itself, the stats counters are atomic.
pub(crate) struct ResolveContext<'a> {
    pub records: &'a [Record],
    pub locator: &'a ValueLocator,
    pub cache: &'a FillCache,
    pub stats: &'a StatsCollector,
    pub math: &'a dyn ValueMath,
    pub policy: FillPolicy,
}

/// Result of resolving one change cell. `value: None` means the point is
/// unresolvable for this run (no valid neighbor on at least one side).
#[derive(Debug, Clone, Copy)]
pub(crate) struct PointOutcome {
    pub column: usize,
    pub value: Option<f64>,
}

/// Cache-first resolution of one absent change cell. Computes nothing when
/// the cache already holds the value; otherwise builds the data point from
/// the nearest valid neighbors, applies the fill policy, and memoizes the
/// result. Never writes into the records; the coordinating thread does that.
pub(crate) fn resolve_change_cell(
    ctx: &ResolveContext<'_>,
    channel: usize,
    channel_name: &str,
    column: usize,
    timestamp: i64,
    position: usize,
) -> PointOutcome {
    let key = FillCacheKey::new(channel_name, timestamp, column);
    if let Some(value) = ctx.cache.get(&key) {
        ctx.stats.record_cache_hit();
        return PointOutcome {
            column,
            value: Some(value),
        };
    }
    ctx.stats.record_cache_miss();

    let previous = neighbor(ctx, channel, column, position, true);
    let next = neighbor(ctx, channel, column, position, false);
    let (Some(previous), Some(next)) = (previous, next) else {
        // Unresolvable gap: terminal for this point within the run.
        return PointOutcome {
            column,
            value: None,
        };
    };

    let point = MissingDataPoint {
        channel,
        column,
        timestamp,
        position,
        previous,
        next,
        base_estimate: ctx.math.average(previous.value, next.value),
    };
    let value = fill_value(&point, ctx.policy, ctx.math);
    ctx.cache.set(key, value);
    PointOutcome {
        column,
        value: Some(value),
    }
}

fn neighbor(
    ctx: &ResolveContext<'_>,
    channel: usize,
    column: usize,
    position: usize,
    before: bool,
) -> Option<PointNeighbor> {
    let found = if before {
        ctx.locator.nearest_before(channel, column, position)?
    } else {
        ctx.locator.nearest_after(channel, column, position)?
    };
    ctx.records
        .get(found)?
        .cell(channel, column)
        .map(|value| PointNeighbor {
            position: found,
            value,
        })
}

/// Applies the configured interpolation policy and clamps the result into
/// the neighbor envelope: a fill never extrapolates beyond its bounds.
pub(crate) fn fill_value(
    point: &MissingDataPoint,
    policy: FillPolicy,
    math: &dyn ValueMath,
) -> f64 {
    let raw = match policy {
        FillPolicy::Midpoint => point.base_estimate,
        FillPolicy::Weighted => {
            let span = point.next.position.saturating_sub(point.previous.position);
            if span <= 1 {
                point.base_estimate
            } else {
                let t = (point.position - point.previous.position) as f64 / span as f64;
                point.previous.value + (point.next.value - point.previous.value) * t
            }
        }
    };
    let clamped = math.clamp(raw, point.previous.value, point.next.value);
    math.round(clamped)
}

#[cfg(test)]
mod tests {
    use super::fill_value;
    use crate::services::fill::FillPolicy;
    use crate::services::value_math::StandardValueMath;
    use crate::value_objects::period::{MissingDataPoint, PointNeighbor};

    fn point(position: usize, prev: (usize, f64), next: (usize, f64)) -> MissingDataPoint {
        MissingDataPoint {
            channel: 0,
            column: 0,
            timestamp: 60 * (position as i64 + 1),
            position,
            previous: PointNeighbor {
                position: prev.0,
                value: prev.1,
            },
            next: PointNeighbor {
                position: next.0,
                value: next.1,
            },
            base_estimate: prev.1 + (next.1 - prev.1) / 2.0,
        }
    }

    #[test]
    fn midpoint_policy_uses_the_unweighted_base() {
        let math = StandardValueMath::default();
        let p = point(1, (0, 10.0), (3, 40.0));
        assert_eq!(fill_value(&p, FillPolicy::Midpoint, &math), 25.0);
    }

    #[test]
    fn weighted_policy_interpolates_by_position() {
        let math = StandardValueMath::default();
        assert_eq!(
            fill_value(&point(1, (0, 10.0), (3, 40.0)), FillPolicy::Weighted, &math),
            20.0
        );
        assert_eq!(
            fill_value(&point(2, (0, 10.0), (3, 40.0)), FillPolicy::Weighted, &math),
            30.0
        );
    }

    #[test]
    fn weighted_policy_on_single_point_gap_matches_midpoint() {
        let math = StandardValueMath::default();
        let p = point(1, (0, 10.0), (2, 40.0));
        assert_eq!(fill_value(&p, FillPolicy::Weighted, &math), 25.0);
    }

    #[test]
    fn fills_stay_inside_the_neighbor_envelope_on_descending_series() {
        let math = StandardValueMath::default();
        let p = point(1, (0, 40.0), (3, 10.0));
        let v = fill_value(&p, FillPolicy::Weighted, &math);
        assert!((10.0..=40.0).contains(&v));
    }
}
