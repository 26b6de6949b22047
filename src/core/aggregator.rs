//! Fans a conversion request out into one rate fetch per (source, target)
//! pair and gathers the results.

use crate::core::notify::{Notification, Notifier};
use crate::core::rates::{RateHistoryProvider, RateSeries};
use crate::core::request::{ConversionRequest, Source};
use crate::core::sampler::sample_monthly;
use anyhow::{Result, ensure};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Result of one conversion request. `rates` holds only non-empty series and
/// carries no ordering guarantee; look series up by (source index, target).
#[derive(Debug, Clone)]
pub struct Conversion {
    pub request: ConversionRequest,
    pub rates: Vec<RateSeries>,
}

impl Conversion {
    pub fn sources(&self) -> &[Source] {
        &self.request.sources
    }

    pub fn series(&self, source_index: usize, target: &str) -> Option<&RateSeries> {
        self.rates
            .iter()
            .find(|s| s.source_index == source_index && s.target == target)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Fetches every pair concurrently and waits for all of them to settle.
/// Empty results are dropped silently. `update_callback` runs once per
/// settled fetch.
pub async fn fetch_conversion(
    provider: &dyn RateHistoryProvider,
    request: &ConversionRequest,
    update_callback: &(dyn Fn() + Send + Sync),
) -> Result<Conversion> {
    let fetches = request.pairs().map(|(source_index, source, target)| async move {
        let points = provider
            .fetch_rates(
                &source.currency,
                target,
                request.date_range.as_ref(),
                request.resolution,
            )
            .await;
        update_callback();
        (source_index, source, target, points)
    });
    let results = join_all(fetches).await;
    debug!(fetches = results.len(), "All rate fetches settled");

    let mut rates = Vec::new();
    for (source_index, source, target, mut points) in results {
        for point in &points {
            ensure!(
                point.source == source.currency && point.target == target,
                "Provider returned {}/{} rate for requested pair {}/{}",
                point.source,
                point.target,
                source.currency,
                target
            );
        }

        if request.monthly_only {
            points = sample_monthly(&points);
        } else {
            points.sort_by_key(|p| p.time);
        }

        if points.is_empty() {
            debug!(
                "No {}/{} rates returned, dropping series",
                source.currency, target
            );
            continue;
        }
        rates.push(RateSeries {
            source_index,
            target: target.to_string(),
            points,
        });
    }

    Ok(Conversion {
        request: request.clone(),
        rates,
    })
}

fn report(notifier: &dyn Notifier, result: &Result<Conversion>) {
    match result {
        Ok(conversion) => {
            info!(series = conversion.rates.len(), "Conversion complete");
            notifier.notify(Notification::conversion_complete());
        }
        Err(e) => {
            error!(error = %e, "Conversion failed");
            notifier.notify(Notification::conversion_failed());
        }
    }
}

/// Runs one conversion and raises a single completion or failure
/// notification once every fetch has settled.
pub async fn convert(
    provider: &dyn RateHistoryProvider,
    notifier: &dyn Notifier,
    request: &ConversionRequest,
    update_callback: &(dyn Fn() + Send + Sync),
) -> Result<Conversion> {
    let result = fetch_conversion(provider, request, update_callback).await;
    report(notifier, &result);
    result
}

/// Holds the latest conversion across repeated submissions. Each submission
/// gets a generation number; a result that lands after a newer submission
/// has started is discarded instead of replacing the newer one.
pub struct ConversionSession {
    provider: Arc<dyn RateHistoryProvider>,
    notifier: Arc<dyn Notifier>,
    generation: AtomicU64,
    latest: Mutex<Option<Arc<Conversion>>>,
}

impl ConversionSession {
    pub fn new(provider: Arc<dyn RateHistoryProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            notifier,
            generation: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Returns `Ok(None)` when the result was superseded by a newer
    /// submission.
    pub async fn submit(
        &self,
        request: &ConversionRequest,
        update_callback: &(dyn Fn() + Send + Sync),
    ) -> Result<Option<Arc<Conversion>>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Submitting conversion");

        let result = fetch_conversion(self.provider.as_ref(), request, update_callback).await;

        let mut latest = self.latest.lock().await;
        if generation != self.generation.load(Ordering::SeqCst) {
            warn!(generation, "Discarding stale conversion result");
            return Ok(None);
        }
        report(self.notifier.as_ref(), &result);

        let conversion = Arc::new(result?);
        *latest = Some(Arc::clone(&conversion));
        Ok(Some(conversion))
    }

    pub async fn latest(&self) -> Option<Arc<Conversion>> {
        self.latest.lock().await.clone()
    }
}
