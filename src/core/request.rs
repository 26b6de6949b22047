//! Conversion requests and their shareable query-string form

use crate::core::rates::{DateRange, Resolution};
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use reqwest::Url;
use std::collections::HashMap;

pub const DEFAULT_AMOUNT: f64 = 1000.0;
pub const DEFAULT_SOURCE: &str = "USD";
pub const MAX_SOURCES: usize = 2;

/// A (currency, amount) pair to convert from.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub currency: String,
    pub amount: f64,
}

impl Source {
    pub fn new(currency: &str, amount: f64) -> Self {
        Self {
            currency: currency.trim().to_uppercase(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub sources: Vec<Source>,
    pub targets: Vec<String>,
    pub monthly_only: bool,
    pub date_range: Option<DateRange>,
    pub resolution: Resolution,
}

fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("Invalid currency code: '{code}'");
    }
    Ok(())
}

impl ConversionRequest {
    /// Builds a normalized request. Codes are upper-cased, duplicate targets
    /// collapse, and a target that equals the currency of every source is
    /// dropped since it has nothing to convert from.
    pub fn new(
        sources: Vec<Source>,
        targets: Vec<String>,
        monthly_only: bool,
        date_range: Option<DateRange>,
    ) -> Result<Self> {
        if sources.is_empty() || sources.len() > MAX_SOURCES {
            bail!(
                "Expected 1 to {MAX_SOURCES} sources, got {}",
                sources.len()
            );
        }
        for source in &sources {
            validate_code(&source.currency)?;
            if !source.amount.is_finite() || source.amount < 0.0 {
                bail!(
                    "Invalid amount for {}: {}",
                    source.currency,
                    source.amount
                );
            }
        }

        let mut normalized: Vec<String> = Vec::new();
        for target in targets {
            let target = target.trim().to_uppercase();
            validate_code(&target)?;
            if sources.iter().all(|s| s.currency == target) || normalized.contains(&target) {
                continue;
            }
            normalized.push(target);
        }
        if normalized.is_empty() {
            bail!("Please select at least one target currency");
        }

        Ok(Self {
            sources,
            targets: normalized,
            monthly_only,
            date_range,
            resolution: Resolution::default(),
        })
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn is_compare(&self) -> bool {
        self.sources.len() == MAX_SOURCES
    }

    /// Every (source index, source, target) combination to fetch; a source is
    /// never paired with its own currency.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, &Source, &str)> {
        self.sources.iter().enumerate().flat_map(move |(i, source)| {
            self.targets
                .iter()
                .filter(move |t| **t != source.currency)
                .map(move |t| (i, source, t.as_str()))
        })
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![(
            "mode",
            if self.is_compare() { "compare" } else { "single" }.to_string(),
        )];
        for (i, source) in self.sources.iter().enumerate() {
            let (amount_key, source_key) = if i == 0 {
                ("amount", "source")
            } else {
                ("amount2", "source2")
            };
            pairs.push((amount_key, source.amount.to_string()));
            pairs.push((source_key, source.currency.clone()));
        }
        pairs.push(("targets", self.targets.join(",")));
        pairs.push(("monthly", self.monthly_only.to_string()));
        if let Some(range) = &self.date_range {
            pairs.push(("from", range.from.to_string()));
            pairs.push(("to", range.to.to_string()));
        }
        if self.resolution != Resolution::default() {
            pairs.push(("resolution", self.resolution.to_string()));
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Restores a request from a query string (with or without the leading
    /// `?`) or from a full URL carrying one. Unknown keys are ignored.
    pub fn from_query_string(input: &str) -> Result<Self> {
        let input = input.trim();
        let url = if input.contains("://") {
            Url::parse(input)
        } else {
            Url::parse(&format!(
                "http://localhost/?{}",
                input.trim_start_matches('?')
            ))
        }
        .with_context(|| format!("Failed to parse query string: {input}"))?;

        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let get = |key: &str| params.get(key).map(String::as_str);

        let parse_amount = |key: &str| -> Result<f64> {
            get(key).map_or(Ok(DEFAULT_AMOUNT), |v| {
                v.parse::<f64>()
                    .with_context(|| format!("Invalid {key}: '{v}'"))
            })
        };
        let parse_date = |key: &str| -> Result<Option<NaiveDate>> {
            get(key)
                .map(|v| {
                    NaiveDate::parse_from_str(v, "%Y-%m-%d")
                        .with_context(|| format!("Invalid {key} date: '{v}'"))
                })
                .transpose()
        };

        let mut sources = vec![Source::new(
            get("source").unwrap_or(DEFAULT_SOURCE),
            parse_amount("amount")?,
        )];
        match get("mode").unwrap_or("single") {
            "single" => {}
            "compare" => {
                let currency = get("source2")
                    .ok_or_else(|| anyhow!("Compare mode requires 'source2'"))?;
                sources.push(Source::new(currency, parse_amount("amount2")?));
            }
            other => bail!("Invalid mode: '{other}'"),
        }

        let targets = get("targets")
            .unwrap_or_default()
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect();

        let monthly_only = match get("monthly") {
            None => false,
            Some(v) => v
                .parse::<bool>()
                .with_context(|| format!("Invalid monthly flag: '{v}'"))?,
        };

        let date_range = match (parse_date("from")?, parse_date("to")?) {
            (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
            (None, None) => None,
            _ => bail!("Both 'from' and 'to' are required for a date range"),
        };

        let resolution = get("resolution")
            .map(str::parse::<Resolution>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self::new(sources, targets, monthly_only, date_range)?.with_resolution(resolution))
    }
}
