//! Differences between the two sources of a compare-mode conversion.
//!
//! Positive values mean the first source converts to more of the target than
//! the second one.

use crate::core::series::AlignedRow;

/// `amount(source 0) - amount(source 1)` for `target` at this row, or `None`
/// when either side has no observation.
pub fn difference(row: &AlignedRow, target: &str) -> Option<f64> {
    let first = row.get(0, target)?;
    let second = row.get(1, target)?;
    Some(first - second)
}

/// Sum of absolute differences across rows. Rows without a comparable pair
/// contribute nothing.
pub fn total_absolute_difference(rows: &[AlignedRow], target: &str) -> f64 {
    rows.iter()
        .filter_map(|row| difference(row, target))
        .map(f64::abs)
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetComparison {
    pub target: String,
    pub comparable_rows: usize,
    pub total_absolute_difference: f64,
    pub latest_difference: Option<f64>,
}

/// Per-target summary, in the order of `targets`.
pub fn summarize(rows: &[AlignedRow], targets: &[String]) -> Vec<TargetComparison> {
    targets
        .iter()
        .map(|target| TargetComparison {
            target: target.clone(),
            comparable_rows: rows
                .iter()
                .filter(|row| difference(row, target).is_some())
                .count(),
            total_absolute_difference: total_absolute_difference(rows, target),
            latest_difference: rows.iter().rev().find_map(|row| difference(row, target)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::SeriesKey;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn row(day: u32, values: &[(usize, &str, f64)]) -> AlignedRow {
        let time = Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap();
        AlignedRow {
            time,
            date: format!("May {day}, 2024"),
            values: values
                .iter()
                .map(|(i, t, v)| (SeriesKey::new(*i, t), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_difference_sign_follows_first_source() {
        let row = row(1, &[(0, "INR", 1000.0 * 83.0), (1, "INR", 500.0 * 90.0)]);
        assert_eq!(difference(&row, "INR"), Some(38000.0));
    }

    #[test]
    fn test_difference_requires_both_sides() {
        let row = row(1, &[(0, "INR", 83000.0), (1, "EUR", 500.0)]);
        assert_eq!(difference(&row, "INR"), None);
        assert_eq!(difference(&row, "EUR"), None);
    }

    #[test]
    fn test_total_ignores_incomplete_rows() {
        let rows = vec![
            row(1, &[(0, "INR", 83000.0)]),
            row(2, &[(0, "INR", 40000.0), (1, "INR", 45000.0)]),
        ];
        assert_eq!(total_absolute_difference(&rows, "INR"), 5000.0);
        assert_eq!(total_absolute_difference(&rows, "GBP"), 0.0);
    }

    #[test]
    fn test_summarize() {
        let rows = vec![
            row(1, &[(0, "INR", 100.0), (1, "INR", 90.0)]),
            row(2, &[(0, "INR", 80.0), (1, "INR", 95.0)]),
            row(3, &[(0, "INR", 85.0)]),
        ];

        let summary = summarize(&rows, &["INR".to_string()]);
        assert_eq!(
            summary,
            vec![TargetComparison {
                target: "INR".to_string(),
                comparable_rows: 2,
                total_absolute_difference: 25.0,
                latest_difference: Some(-15.0),
            }]
        );
    }
}
