//! Historical exchange-rate types and the provider seam

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// One historical observation of `source -> target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub source: String,
    pub target: String,
    pub value: f64,
    pub time: DateTime<Utc>,
}

/// Points fetched for one (source, target) combination, tagged with the index
/// of the source they were requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    pub source_index: usize,
    pub target: String,
    pub points: Vec<RatePoint>,
}

impl RateSeries {
    pub fn latest(&self) -> Option<&RatePoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Hourly,
    #[default]
    Daily,
}

impl Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Resolution::Hourly => "hourly",
                Resolution::Daily => "daily",
            }
        )
    }
}

impl FromStr for Resolution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" => Ok(Resolution::Hourly),
            "daily" => Ok(Resolution::Daily),
            _ => Err(anyhow::anyhow!("Invalid resolution: {}", s)),
        }
    }
}

/// Inclusive calendar-day window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            bail!("Invalid date range: {from} is after {to}");
        }
        Ok(Self { from, to })
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days()
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        let date = time.date_naive();
        self.from <= date && date <= self.to
    }
}

/// Source of historical rates.
///
/// Implementations never fail: any transport or parse problem is reported
/// out of band and surfaces here as an empty result.
#[async_trait]
pub trait RateHistoryProvider: Send + Sync {
    async fn fetch_rates(
        &self,
        source: &str,
        target: &str,
        range: Option<&DateRange>,
        resolution: Resolution,
    ) -> Vec<RatePoint>;
}
