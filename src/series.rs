use crate::models::{ChartSeries, MetricRow, MetricSeries};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::Value;
use std::fmt::Write;
use tracing::{debug, warn};

/// How `to_series` orders its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Ascending by key, chronologically when both keys are integers.
    Time,
    /// Ascending by net total, lowest contributor first.
    Rank,
}

/// Column positions of the count and the key within a result row.
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    pub count: usize,
    pub key: usize,
}

impl RowLayout {
    pub const COUNT_THEN_KEY: Self = Self { count: 0, key: 1 };
    pub const KEY_THEN_COUNT: Self = Self { count: 1, key: 0 };
}

/// Reads a count cell. Non-negative integers, integral floats and numeric
/// strings are accepted; everything else counts as 0.
pub fn parse_count(value: &Value) -> i64 {
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.is_finite())
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.filter(|count| *count >= 0).unwrap_or_else(|| {
        warn!("non-numeric count {value}, using 0");
        0
    })
}

fn parse_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn metric_rows(rows: &[Vec<Value>], layout: RowLayout) -> Vec<MetricRow> {
    rows.iter()
        .filter_map(|row| {
            let (Some(count), Some(key)) = (row.get(layout.count), row.get(layout.key)) else {
                debug!("skipping short row {row:?}");
                return None;
            };
            let Some(key) = parse_key(key) else {
                debug!("skipping row without key {row:?}");
                return None;
            };
            Some(MetricRow::new(parse_count(count), key))
        })
        .collect()
}

/// Merges the add and remove buckets into one map keyed by bucket key.
pub fn aggregate(add_rows: &[MetricRow], remove_rows: &[MetricRow]) -> MetricSeries {
    let mut series = MetricSeries::new();
    for row in add_rows {
        let entry = series.entry(row.key.clone()).or_default();
        entry.add = entry.add.saturating_add(row.count);
    }
    for row in remove_rows {
        let entry = series.entry(row.key.clone()).or_default();
        entry.remove = entry.remove.saturating_add(row.count);
    }
    series
}

struct Point<'a> {
    key: &'a str,
    add: i64,
    remove: i64,
    total: i64,
}

/// Flattens a series into chart arrays. Ties always fall back to the key so
/// the output never depends on input order.
pub fn to_series(series: &MetricSeries, mode: SortMode) -> ChartSeries {
    let mut points: Vec<Point<'_>> = series
        .iter()
        .map(|(key, counts)| Point {
            key,
            add: counts.add,
            remove: counts.remove.saturating_neg(),
            total: counts.add.saturating_sub(counts.remove),
        })
        .collect();

    match mode {
        SortMode::Time => points.sort_by(|a, b| time_sort_key(a.key).cmp(&time_sort_key(b.key))),
        SortMode::Rank => points.sort_by(|a, b| a.total.cmp(&b.total).then_with(|| a.key.cmp(b.key))),
    }

    let mut out = ChartSeries {
        keys: Vec::with_capacity(points.len()),
        add: Vec::with_capacity(points.len()),
        remove: Vec::with_capacity(points.len()),
        total: None,
    };
    let mut total = Vec::with_capacity(points.len());
    for point in points {
        out.keys.push(point.key.to_string());
        out.add.push(point.add);
        out.remove.push(point.remove);
        total.push(point.total);
    }
    if mode == SortMode::Rank {
        out.total = Some(total);
    }
    out
}

/// Integer keys first in chronological order, then everything else as text.
fn time_sort_key(key: &str) -> (bool, i64, &str) {
    match key.trim().parse::<i64>() {
        Ok(secs) => (false, secs, key),
        Err(_) => (true, 0, key),
    }
}

/// Renders epoch-second keys with an explicit offset and strftime pattern.
#[derive(Debug, Clone)]
pub struct TimestampFormat {
    pub offset: FixedOffset,
    pub pattern: String,
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            pattern: Self::DEFAULT_PATTERN.to_string(),
        }
    }
}

impl TimestampFormat {
    pub const DEFAULT_PATTERN: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Unparsable input is returned as-is.
    pub fn format(&self, epoch_seconds: &str) -> String {
        let Some(time) = epoch_seconds
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            return epoch_seconds.to_string();
        };

        let mut out = String::new();
        if write!(out, "{}", time.with_timezone(&self.offset).format(&self.pattern)).is_err() {
            return epoch_seconds.to_string();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpCounts;
    use serde_json::json;

    fn rows(items: &[(i64, &str)]) -> Vec<MetricRow> {
        items.iter().map(|(count, key)| MetricRow::new(*count, *key)).collect()
    }

    #[test]
    fn aggregate_covers_union_of_keys() {
        let add = rows(&[(3, "alice"), (1, "bob"), (2, "alice")]);
        let remove = rows(&[(4, "carol"), (1, "alice")]);

        let series = aggregate(&add, &remove);
        assert_eq!(series.len(), 3);
        assert_eq!(series["alice"], OpCounts { add: 5, remove: 1 });
        assert_eq!(series["bob"], OpCounts { add: 1, remove: 0 });
        assert_eq!(series["carol"], OpCounts { add: 0, remove: 4 });
    }

    #[test]
    fn rank_series_orders_by_net_total() {
        let add = rows(&[(3, "alice"), (1, "bob")]);
        let remove = rows(&[(1, "alice")]);

        let chart = to_series(&aggregate(&add, &remove), SortMode::Rank);
        assert_eq!(chart.keys, vec!["bob", "alice"]);
        assert_eq!(chart.add, vec![1, 3]);
        assert_eq!(chart.remove, vec![0, -1]);
        assert_eq!(chart.total, Some(vec![1, 2]));
    }

    #[test]
    fn rank_ties_break_on_key() {
        let add = rows(&[(2, "zed"), (2, "amy"), (5, "max")]);
        let remove = rows(&[(3, "max")]);

        let chart = to_series(&aggregate(&add, &remove), SortMode::Rank);
        assert_eq!(chart.keys, vec!["amy", "max", "zed"]);
        assert_eq!(chart.total, Some(vec![2, 2, 2]));
        assert!(chart.remove.iter().all(|value| *value <= 0));
    }

    #[test]
    fn time_series_is_chronological() {
        let add = rows(&[(1, "1700000000"), (2, "999999999")]);
        let remove = rows(&[(1, "1600000000")]);

        let chart = to_series(&aggregate(&add, &remove), SortMode::Time);
        assert_eq!(chart.keys, vec!["999999999", "1600000000", "1700000000"]);
        assert_eq!(chart.add, vec![2, 0, 1]);
        assert_eq!(chart.remove, vec![0, -1, 0]);
        assert_eq!(chart.total, None);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let chart = to_series(&aggregate(&[], &[]), SortMode::Rank);
        assert!(chart.is_empty());
        assert!(chart.add.is_empty());
        assert!(chart.remove.is_empty());
        assert_eq!(chart.total, Some(vec![]));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let add = rows(&[(4, "b"), (4, "a"), (1, "c")]);
        let remove = rows(&[(2, "c"), (0, "a")]);

        let first = to_series(&aggregate(&add, &remove), SortMode::Rank);
        let second = to_series(&aggregate(&add, &remove), SortMode::Rank);
        assert_eq!(first, second);
    }

    #[test]
    fn counts_parse_strings_and_numbers() {
        assert_eq!(parse_count(&json!(7)), 7);
        assert_eq!(parse_count(&json!("12")), 12);
        assert_eq!(parse_count(&json!(3.0)), 3);
        assert_eq!(parse_count(&json!("many")), 0);
        assert_eq!(parse_count(&json!(null)), 0);
        assert_eq!(parse_count(&json!(2.5)), 0);
        assert_eq!(parse_count(&json!("-3")), 0);
        assert_eq!(parse_count(&json!(-4)), 0);
    }

    #[test]
    fn negative_counts_never_flip_remove_positive() {
        let remove = vec![MetricRow::new(parse_count(&json!("-3")), "a")];
        let chart = to_series(&aggregate(&[], &remove), SortMode::Rank);
        assert_eq!(chart.remove, vec![0]);
        assert!(chart.remove.iter().all(|value| *value <= 0));
    }

    #[test]
    fn time_series_puts_numeric_keys_before_text() {
        let add = rows(&[(1, "10"), (1, "1a"), (1, "9"), (1, "abc"), (1, " 5")]);
        let remove = rows(&[(2, "13x"), (2, "7")]);

        let chart = to_series(&aggregate(&add, &remove), SortMode::Time);
        assert_eq!(chart.keys, vec![" 5", "7", "9", "10", "13x", "1a", "abc"]);
        assert_eq!(chart.add, vec![1, 0, 1, 1, 0, 1, 1]);
        assert_eq!(chart.remove, vec![0, -2, 0, 0, -2, 0, 0]);
    }

    #[test]
    fn time_series_sorts_many_mixed_keys() {
        let add: Vec<MetricRow> = (0..200)
            .flat_map(|n| [MetricRow::new(1, n.to_string()), MetricRow::new(1, format!("{n}x"))])
            .collect();

        let chart = to_series(&aggregate(&add, &[]), SortMode::Time);
        assert_eq!(chart.len(), 400);
        let numeric: Vec<i64> = chart.keys[..200].iter().map(|key| key.parse().unwrap()).collect();
        assert_eq!(numeric, (0..200).collect::<Vec<i64>>());
        assert!(chart.keys[200..].iter().all(|key| key.ends_with('x')));
        assert!(chart.keys[200..].windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn metric_rows_respect_layout_and_skip_bad_rows() {
        let raw = vec![
            vec![json!("3"), json!("alice")],
            vec![json!(1)],
            vec![json!(2), json!(null)],
            vec![json!(5), json!(1700000000)],
        ];
        let parsed = metric_rows(&raw, RowLayout::COUNT_THEN_KEY);
        assert_eq!(parsed, rows(&[(3, "alice"), (5, "1700000000")]));

        let swapped = vec![vec![json!("add"), json!("9")]];
        assert_eq!(metric_rows(&swapped, RowLayout::KEY_THEN_COUNT), rows(&[(9, "add")]));
    }

    #[test]
    fn timestamps_format_in_order() {
        let format = TimestampFormat::default();
        let early = format.format("1700000000");
        let late = format.format("1700003600");
        assert_eq!(early, "2023-11-14 22:13:20");
        assert!(!late.is_empty());
        assert!(early < late);
    }

    #[test]
    fn timestamps_use_configured_offset() {
        let format = TimestampFormat {
            offset: FixedOffset::east_opt(8 * 3600).unwrap(),
            pattern: "%Y-%m-%d %H:%M".to_string(),
        };
        assert_eq!(format.format("1700000000"), "2023-11-15 06:13");
    }

    #[test]
    fn unparsable_timestamps_pass_through() {
        let format = TimestampFormat::default();
        assert_eq!(format.format("yesterday"), "yesterday");
    }
}
