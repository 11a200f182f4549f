use crate::entities::layout::DatasetLayout;
use crate::services::time_index::TimeIndex;
use crate::value_objects::period::MissingPeriod;
use crate::value_objects::record::Record;
use std::collections::BTreeMap;

/// Enumerates missing periods: per channel, maximal runs of consecutive
/// indexed timestamps where at least one change column is absent. Channels
/// sharing an identical run are grouped into one period. Output is sorted by
/// period start ascending; chronological processing order is a hard
/// requirement for cumulative reconciliation downstream.
pub fn detect_missing_periods(
    records: &[Record],
    index: &TimeIndex,
    layout: &DatasetLayout,
) -> Vec<MissingPeriod> {
    // Positions the index actually owns, in series order. Later duplicates
    // of a timestamp are invisible to the detector.
    let indexed: Vec<usize> = (0..records.len())
        .filter(|&pos| index.position(records[pos].timestamp) == Some(pos))
        .collect();
    if indexed.is_empty() {
        return Vec::new();
    }

    // (first, last) slot range into `indexed` -> affected channel indices.
    let mut runs: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
    for channel in 0..layout.channel_count() {
        let mut run_start: Option<usize> = None;
        for (slot, &pos) in indexed.iter().enumerate() {
            let missing = (0..layout.change_columns())
                .any(|column| records[pos].cell(channel, column).is_none());
            if missing {
                run_start.get_or_insert(slot);
            } else if let Some(start) = run_start.take() {
                runs.entry((start, slot - 1)).or_default().push(channel);
            }
        }
        if let Some(start) = run_start {
            runs.entry((start, indexed.len() - 1))
                .or_default()
                .push(channel);
        }
    }

    runs.into_iter()
        .map(|((first, last), channels)| {
            let mut names: Vec<String> = channels
                .iter()
                .filter_map(|&c| layout.channel_name(c).map(str::to_string))
                .collect();
            names.sort();
            MissingPeriod {
                missing_timestamps: indexed[first..=last]
                    .iter()
                    .map(|&pos| records[pos].timestamp)
                    .collect(),
                channels: names,
                start_time: first
                    .checked_sub(1)
                    .map(|slot| records[indexed[slot]].timestamp),
                end_time: indexed.get(last + 1).map(|&pos| records[pos].timestamp),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::detect_missing_periods;
    use crate::entities::layout::DatasetLayout;
    use crate::services::time_index::TimeIndex;
    use crate::value_objects::record::{Record, Row};

    fn record(ts: i64, cells: &[(&str, Option<f64>)]) -> Record {
        Record {
            timestamp: ts,
            rows: cells
                .iter()
                .map(|(name, change)| Row {
                    channel: name.to_string(),
                    values: vec![*change, Some(0.0)],
                })
                .collect(),
        }
    }

    #[test]
    fn groups_identical_spans_and_bounds_them() {
        let records = vec![
            record(60, &[("A", Some(1.0)), ("B", Some(1.0))]),
            record(120, &[("A", None), ("B", None)]),
            record(180, &[("A", None), ("B", None)]),
            record(240, &[("A", Some(4.0)), ("B", Some(4.0))]),
        ];
        let layout = DatasetLayout::resolve(&records, None).expect("layout");
        let index = TimeIndex::build(&records);

        let periods = detect_missing_periods(&records, &index, &layout);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].missing_timestamps, vec![120, 180]);
        assert_eq!(periods[0].channels, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(periods[0].start_time, Some(60));
        assert_eq!(periods[0].end_time, Some(240));
    }

    #[test]
    fn differing_spans_become_separate_periods_in_order() {
        // A is missing at 120..180, B only at 180..240.
        let records = vec![
            record(60, &[("A", Some(1.0)), ("B", Some(1.0))]),
            record(120, &[("A", None), ("B", Some(2.0))]),
            record(180, &[("A", None), ("B", None)]),
            record(240, &[("A", Some(4.0)), ("B", None)]),
            record(300, &[("A", Some(5.0)), ("B", Some(5.0))]),
        ];
        let layout = DatasetLayout::resolve(&records, None).expect("layout");
        let index = TimeIndex::build(&records);

        let periods = detect_missing_periods(&records, &index, &layout);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].channels, vec!["A".to_string()]);
        assert_eq!(periods[0].missing_timestamps, vec![120, 180]);
        assert_eq!(periods[1].channels, vec!["B".to_string()]);
        assert_eq!(periods[1].missing_timestamps, vec![180, 240]);
        assert_eq!(periods[1].start_time, Some(120));
        assert_eq!(periods[1].end_time, Some(300));
    }

    #[test]
    fn edge_gaps_have_open_bounds() {
        let records = vec![
            record(60, &[("A", None)]),
            record(120, &[("A", Some(2.0))]),
            record(180, &[("A", None)]),
        ];
        let layout = DatasetLayout::resolve(&records, None).expect("layout");
        let index = TimeIndex::build(&records);

        let periods = detect_missing_periods(&records, &index, &layout);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].start_time, None);
        assert_eq!(periods[0].end_time, Some(120));
        assert_eq!(periods[1].start_time, Some(120));
        assert_eq!(periods[1].end_time, None);
    }

    #[test]
    fn fully_known_dataset_yields_no_periods() {
        let records = vec![
            record(60, &[("A", Some(1.0))]),
            record(120, &[("A", Some(2.0))]),
        ];
        let layout = DatasetLayout::resolve(&records, None).expect("layout");
        let index = TimeIndex::build(&records);
        assert!(detect_missing_periods(&records, &index, &layout).is_empty());
    }
}
