use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::core::notify::{Notification, Notifier};
use crate::core::rates::{DateRange, RateHistoryProvider, RatePoint, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Day,
    Month,
    Year,
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Unit::Day => "day",
                Unit::Month => "month",
                Unit::Year => "year",
            }
        )
    }
}

/// How far back from today the provider is asked to look: `length` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    pub length: i64,
    pub unit: Unit,
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

/// The provider only answers "N units back from today", so the window must
/// be long enough to reach `range.from`. Without a range one year is asked.
pub fn request_window(range: Option<&DateRange>, today: NaiveDate) -> RequestWindow {
    let Some(range) = range else {
        return RequestWindow {
            length: 1,
            unit: Unit::Year,
        };
    };

    let days_diff = range.days();
    let end_diff = (today - range.to).num_days().max(0);

    if days_diff <= 30 {
        RequestWindow {
            length: days_diff + end_diff + 1,
            unit: Unit::Day,
        }
    } else if days_diff <= 365 {
        RequestWindow {
            length: ceil_div(days_diff, 30) + ceil_div(end_diff, 30) + 1,
            unit: Unit::Month,
        }
    } else {
        RequestWindow {
            length: ceil_div(days_diff, 365) + ceil_div(end_diff, 365) + 1,
            unit: Unit::Year,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WiseRate {
    source: String,
    target: String,
    value: f64,
    /// Epoch milliseconds
    time: i64,
}

/// Historical rates from Wise, optionally routed through a CORS relay.
///
/// Failures never reach the caller: they are logged, reported to the
/// notifier and turned into an empty result.
pub struct WiseRateProvider {
    base_url: String,
    proxy_url: Option<String>,
    notifier: Arc<dyn Notifier>,
}

impl WiseRateProvider {
    pub fn new(base_url: &str, proxy_url: Option<&str>, notifier: Arc<dyn Notifier>) -> Self {
        WiseRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            proxy_url: proxy_url.map(str::to_string),
            notifier,
        }
    }

    fn request_url(
        &self,
        source: &str,
        target: &str,
        window: RequestWindow,
        resolution: Resolution,
    ) -> Result<Url> {
        let length = window.length.to_string();
        let resolution = resolution.to_string();
        let unit = window.unit.to_string();
        let wise_url = Url::parse_with_params(
            &format!("{}/rates/history+live", self.base_url),
            [
                ("source", source),
                ("target", target),
                ("length", length.as_str()),
                ("resolution", resolution.as_str()),
                ("unit", unit.as_str()),
            ],
        )?;

        match &self.proxy_url {
            Some(proxy) => Ok(Url::parse_with_params(proxy, [("url", wise_url.as_str())])?),
            None => Ok(wise_url),
        }
    }

    async fn try_fetch(
        &self,
        source: &str,
        target: &str,
        range: Option<&DateRange>,
        resolution: Resolution,
        today: NaiveDate,
    ) -> Result<Vec<RatePoint>> {
        let window = request_window(range, today);
        let url = self.request_url(source, target, window, resolution)?;
        debug!("Requesting rate history from {}", url);

        let client = reqwest::Client::builder().user_agent("fxv/1.0").build()?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for pair: {}/{}", e, source, target))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for pair: {}/{}",
                response.status(),
                source,
                target
            ));
        }

        let text = response.text().await?;
        let data: Vec<WiseRate> = serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Failed to parse JSON response for {}/{}: {}",
                source,
                target,
                e
            )
        })?;

        let mut points = Vec::with_capacity(data.len());
        for rate in data {
            let time = Utc
                .timestamp_millis_opt(rate.time)
                .single()
                .ok_or_else(|| anyhow!("Invalid timestamp {} for {}/{}", rate.time, source, target))?;
            if range.is_some_and(|r| !r.contains(&time)) {
                continue;
            }
            points.push(RatePoint {
                source: rate.source,
                target: rate.target,
                value: rate.value,
                time,
            });
        }
        debug!(count = points.len(), "Received rate history");
        Ok(points)
    }
}

#[async_trait]
impl RateHistoryProvider for WiseRateProvider {
    #[instrument(
        name = "WiseRateFetch",
        skip_all,
        fields(pair = %format!("{source}/{target}"), resolution = %resolution)
    )]
    async fn fetch_rates(
        &self,
        source: &str,
        target: &str,
        range: Option<&DateRange>,
        resolution: Resolution,
    ) -> Vec<RatePoint> {
        let today = Utc::now().date_naive();
        match self.try_fetch(source, target, range, resolution, today).await {
            Ok(points) => points,
            Err(e) => {
                error!("Error fetching currency rates: {e}");
                self.notifier
                    .notify(Notification::fetch_failed(source, target));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::{NotificationKind, RecordingNotifier};
    use chrono::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_without_range_is_one_year() {
        let window = request_window(None, date(2024, 6, 1));
        assert_eq!(
            window,
            RequestWindow {
                length: 1,
                unit: Unit::Year
            }
        );
    }

    #[test]
    fn test_window_short_range_uses_days() {
        let today = date(2024, 6, 20);
        let range = DateRange::new(date(2024, 6, 5), date(2024, 6, 15)).unwrap();
        assert_eq!(
            request_window(Some(&range), today),
            RequestWindow {
                length: 16,
                unit: Unit::Day
            }
        );
    }

    #[test]
    fn test_window_medium_range_uses_months() {
        let today = date(2024, 6, 30);
        // 60 days, ending 45 days ago
        let range = DateRange::new(date(2024, 3, 17), date(2024, 5, 16)).unwrap();
        assert_eq!(range.days(), 60);
        assert_eq!(
            request_window(Some(&range), today),
            RequestWindow {
                length: 5,
                unit: Unit::Month
            }
        );
    }

    #[test]
    fn test_window_long_range_uses_years() {
        let today = date(2024, 6, 30);
        let range = DateRange::new(today - Duration::days(400), today).unwrap();
        assert_eq!(
            request_window(Some(&range), today),
            RequestWindow {
                length: 3,
                unit: Unit::Year
            }
        );
    }

    #[test]
    fn test_window_future_end_is_clamped() {
        let today = date(2024, 6, 1);
        let range = DateRange::new(date(2024, 5, 30), date(2024, 6, 10)).unwrap();
        assert_eq!(request_window(Some(&range), today).length, 12);
    }

    async fn create_mock_server(length: &str, unit: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/history+live"))
            .and(query_param("source", "USD"))
            .and(query_param("target", "EUR"))
            .and(query_param("length", length))
            .and(query_param("resolution", "daily"))
            .and(query_param("unit", unit))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_history_fetch() {
        let mock_response = r#"[
            {"source": "USD", "target": "EUR", "value": 0.9215, "time": 1704067200000},
            {"source": "USD", "target": "EUR", "value": 0.9230, "time": 1704153600000}
        ]"#;
        let mock_server = create_mock_server("1", "year", mock_response).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Daily)
            .await;

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 0.9215);
        assert_eq!(points[0].time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(points[1].source, "USD");
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn test_range_post_filters_points() {
        let today = date(2024, 6, 20);
        let range = DateRange::new(date(2024, 6, 5), date(2024, 6, 15)).unwrap();
        let at = |day: u32| {
            date(2024, 6, day)
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp_millis()
        };
        let mock_response = format!(
            r#"[
                {{"source": "USD", "target": "EUR", "value": 1.0, "time": {}}},
                {{"source": "USD", "target": "EUR", "value": 2.0, "time": {}}},
                {{"source": "USD", "target": "EUR", "value": 3.0, "time": {}}},
                {{"source": "USD", "target": "EUR", "value": 4.0, "time": {}}}
            ]"#,
            at(4),
            at(5),
            at(15),
            at(16)
        );
        let mock_server = create_mock_server("16", "day", &mock_response).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .try_fetch("USD", "EUR", Some(&range), Resolution::Daily, today)
            .await
            .unwrap();

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_hourly_resolution_is_sent_to_provider() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/history+live"))
            .and(query_param("resolution", "hourly"))
            .and(query_param("length", "1"))
            .and(query_param("unit", "year"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"source": "USD", "target": "EUR", "value": 0.92, "time": 1704067200000}]"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Hourly)
            .await;

        assert_eq!(points.len(), 1);
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn test_routes_through_proxy() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/raw"))
            .and(query_param(
                "url",
                "https://wise.com/rates/history+live?source=USD&target=EUR&length=1&resolution=daily&unit=year",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"source": "USD", "target": "EUR", "value": 0.92, "time": 1704067200000}]"#,
            ))
            .mount(&mock_server)
            .await;
        let notifier = Arc::new(RecordingNotifier::new());
        let proxy = format!("{}/raw", mock_server.uri());
        let provider = WiseRateProvider::new("https://wise.com/", Some(&proxy), notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Daily)
            .await;

        assert_eq!(points.len(), 1);
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn test_http_error_yields_empty_result_and_notification() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates/history+live"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Daily)
            .await;

        assert!(points.is_empty());
        assert_eq!(notifier.kinds(), vec![NotificationKind::FetchFailed]);
    }

    #[tokio::test]
    async fn test_malformed_response_yields_empty_result_and_notification() {
        let mock_server =
            create_mock_server("1", "year", r#"{"error": "unsupported currency"}"#).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Daily)
            .await;

        assert!(points.is_empty());
        assert_eq!(notifier.kinds(), vec![NotificationKind::FetchFailed]);
    }

    #[tokio::test]
    async fn test_empty_response_is_not_a_failure() {
        let mock_server = create_mock_server("1", "year", "[]").await;
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = WiseRateProvider::new(&mock_server.uri(), None, notifier.clone());

        let points = provider
            .fetch_rates("USD", "EUR", None, Resolution::Daily)
            .await;

        assert!(points.is_empty());
        assert!(notifier.take().is_empty());
    }
}
