//! Aligns converted amounts of every series on a shared date axis.

use crate::core::currency::format_date;
use crate::core::rates::RateSeries;
use crate::core::request::Source;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identity of one source -> target series within a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub source_index: usize,
    pub target: String,
}

impl SeriesKey {
    pub fn new(source_index: usize, target: &str) -> Self {
        Self {
            source_index,
            target: target.to_string(),
        }
    }

    /// Human readable label such as `USD_1000_to_INR`.
    pub fn label(&self, sources: &[Source]) -> String {
        match sources.get(self.source_index) {
            Some(source) => format!("{}_{}_to_{}", source.currency, source.amount, self.target),
            None => format!("source{}_to_{}", self.source_index, self.target),
        }
    }
}

/// Converted amounts observed at one instant. A key is absent when its series
/// has no observation at exactly this time.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub time: DateTime<Utc>,
    pub date: String,
    pub values: BTreeMap<SeriesKey, f64>,
}

impl AlignedRow {
    pub fn get(&self, source_index: usize, target: &str) -> Option<f64> {
        self.values
            .get(&SeriesKey::new(source_index, target))
            .copied()
    }
}

/// Builds one row per distinct timestamp across all series, ascending. Each
/// value is `source.amount * rate`; no gap filling is done.
pub fn build_aligned_rows(sources: &[Source], rates: &[RateSeries]) -> Vec<AlignedRow> {
    let times: BTreeSet<DateTime<Utc>> = rates
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.time))
        .collect();

    let lookups: Vec<(SeriesKey, f64, HashMap<DateTime<Utc>, f64>)> = rates
        .iter()
        .filter_map(|series| {
            let amount = sources.get(series.source_index)?.amount;
            let by_time: HashMap<_, _> = series.points.iter().map(|p| (p.time, p.value)).collect();
            Some((
                SeriesKey::new(series.source_index, &series.target),
                amount,
                by_time,
            ))
        })
        .collect();

    times
        .into_iter()
        .map(|time| {
            let values = lookups
                .iter()
                .filter_map(|(key, amount, by_time)| {
                    by_time.get(&time).map(|rate| (key.clone(), amount * rate))
                })
                .collect();
            AlignedRow {
                time,
                date: format_date(&time),
                values,
            }
        })
        .collect()
}

/// Every series key in `rates`, ordered by source then target.
pub fn series_keys(rates: &[RateSeries]) -> Vec<SeriesKey> {
    let keys: BTreeSet<SeriesKey> = rates
        .iter()
        .map(|s| SeriesKey::new(s.source_index, &s.target))
        .collect();
    keys.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::RatePoint;
    use chrono::TimeZone;

    fn series(source_index: usize, source: &str, target: &str, points: &[(u32, f64)]) -> RateSeries {
        RateSeries {
            source_index,
            target: target.to_string(),
            points: points
                .iter()
                .map(|(day, value)| RatePoint {
                    source: source.to_string(),
                    target: target.to_string(),
                    value: *value,
                    time: Utc.with_ymd_and_hms(2024, 3, *day, 0, 0, 0).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_rows_follow_union_of_timestamps() {
        let sources = vec![Source::new("USD", 1000.0)];
        let rates = vec![
            series(0, "USD", "INR", &[(1, 83.0), (3, 83.2)]),
            series(0, "USD", "EUR", &[(2, 0.92), (3, 0.93)]),
        ];

        let rows = build_aligned_rows(&sources, &rates);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "Mar 1, 2024");
        assert_eq!(rows[0].get(0, "INR"), Some(83000.0));
        assert_eq!(rows[0].get(0, "EUR"), None);
        assert_eq!(rows[1].get(0, "INR"), None);
        assert!((rows[1].get(0, "EUR").unwrap() - 920.0).abs() < 1e-9);
        assert_eq!(rows[2].values.len(), 2);
    }

    #[test]
    fn test_disjoint_series_populate_exactly_one_key_per_row() {
        let sources = vec![Source::new("USD", 1000.0), Source::new("EUR", 500.0)];
        let rates = vec![
            series(0, "USD", "INR", &[(1, 83.0), (3, 83.1), (5, 83.2)]),
            series(1, "EUR", "INR", &[(2, 90.0), (4, 90.1)]),
        ];

        let rows = build_aligned_rows(&sources, &rates);

        assert_eq!(rows.len(), 5);
        for row in &rows {
            assert_eq!(row.values.len(), 1);
        }
        assert!(rows.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_shared_target_is_keyed_by_source() {
        let sources = vec![Source::new("USD", 1000.0), Source::new("EUR", 500.0)];
        let rates = vec![
            series(1, "EUR", "INR", &[(1, 90.0)]),
            series(0, "USD", "INR", &[(1, 83.0)]),
        ];

        let rows = build_aligned_rows(&sources, &rates);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0, "INR"), Some(83000.0));
        assert_eq!(rows[0].get(1, "INR"), Some(45000.0));
        assert_eq!(build_aligned_rows(&sources, &rates), rows);

        let keys = series_keys(&rates);
        assert_eq!(keys[0].label(&sources), "USD_1000_to_INR");
        assert_eq!(keys[1].label(&sources), "EUR_500_to_INR");
    }

    #[test]
    fn test_no_series_no_rows() {
        assert!(build_aligned_rows(&[Source::new("USD", 1.0)], &[]).is_empty());
    }
}
