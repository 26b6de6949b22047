//! Latest-rate summaries with the direction of the most recent move.

use crate::core::rates::{RatePoint, RateSeries};
use crate::core::request::Source;
use crate::core::series::SeriesKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub direction: Direction,
    pub percent_change: f64,
}

/// Compares the last two points of a time-sorted sequence.
pub fn trend(points: &[RatePoint]) -> Option<Trend> {
    let [.., previous, latest] = points else {
        return None;
    };
    if previous.value <= 0.0 {
        return None;
    }

    let percent_change = (latest.value - previous.value) / previous.value * 100.0;
    let direction = if latest.value > previous.value {
        Direction::Up
    } else if latest.value < previous.value {
        Direction::Down
    } else {
        Direction::Flat
    };
    Some(Trend {
        direction,
        percent_change,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestConversion {
    pub key: SeriesKey,
    pub rate: f64,
    pub converted: f64,
    pub trend: Option<Trend>,
}

/// Latest rate and converted amount of every series, ordered by source then
/// target.
pub fn latest_conversions(sources: &[Source], rates: &[RateSeries]) -> Vec<LatestConversion> {
    let mut latest: Vec<LatestConversion> = rates
        .iter()
        .filter_map(|series| {
            let source = sources.get(series.source_index)?;
            let point = series.latest()?;
            Some(LatestConversion {
                key: SeriesKey::new(series.source_index, &series.target),
                rate: point.value,
                converted: source.amount * point.value,
                trend: trend(&series.points),
            })
        })
        .collect();
    latest.sort_by(|a, b| a.key.cmp(&b.key));
    latest
}
