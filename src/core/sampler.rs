//! Reduces a rate series to one observation per calendar month.

use crate::core::rates::RatePoint;
use chrono::Datelike;
use std::collections::HashSet;

/// Keeps the earliest observation of every (year, month), sorted ascending by
/// time. Input order does not matter.
pub fn sample_monthly(points: &[RatePoint]) -> Vec<RatePoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.time);

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|p| seen.insert((p.time.year(), p.time.month())))
        .collect()
}
