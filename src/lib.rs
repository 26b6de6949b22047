pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::request::{ConversionRequest, DEFAULT_AMOUNT, DEFAULT_SOURCE, Source};
use crate::core::{ConversionSession, DateRange, Notifier, Resolution};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Inputs of a `convert` command before validation.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub amount: Option<f64>,
    pub source: Option<String>,
    pub compare_amount: Option<f64>,
    pub compare_source: Option<String>,
    pub targets: Vec<String>,
    pub monthly: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub resolution: Option<Resolution>,
    /// Restores the whole request from a shared query string or URL; the
    /// other fields are ignored when set.
    pub query: Option<String>,
    /// Print the shareable query string of the request.
    pub share: bool,
}

impl ConvertOptions {
    pub fn to_request(&self, config: &AppConfig) -> Result<ConversionRequest> {
        if let Some(query) = &self.query {
            return ConversionRequest::from_query_string(query);
        }

        let mut sources = vec![Source::new(
            self.source.as_deref().unwrap_or(DEFAULT_SOURCE),
            self.amount.unwrap_or(DEFAULT_AMOUNT),
        )];
        match (&self.compare_source, self.compare_amount) {
            (Some(currency), amount) => {
                sources.push(Source::new(currency, amount.unwrap_or(DEFAULT_AMOUNT)))
            }
            (None, Some(_)) => bail!("--compare-amount requires --compare-source"),
            (None, None) => {}
        }

        let targets = if self.targets.is_empty() {
            config.default_targets.clone()
        } else {
            self.targets.clone()
        };

        let date_range = match (self.from, self.to) {
            (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
            (None, None) => None,
            _ => bail!("Both --from and --to are required for a date range"),
        };

        Ok(ConversionRequest::new(sources, targets, self.monthly, date_range)?
            .with_resolution(self.resolution.unwrap_or_default()))
    }
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    Convert(ConvertOptions),
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Currency voyage starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Currencies => {
            cli::currencies::run();
            Ok(())
        }
        AppCommand::Convert(options) => {
            let request = options.to_request(&config)?;
            debug!(?request, "Validated conversion request");
            if options.share {
                println!("?{}", request.to_query_string());
            }

            let notifier: Arc<dyn Notifier> = Arc::new(cli::ui::ConsoleNotifier);
            let wise = &config.providers.wise;
            let provider = providers::WiseRateProvider::new(
                &wise.base_url,
                wise.proxy_url.as_deref(),
                Arc::clone(&notifier),
            );
            let session = ConversionSession::new(Arc::new(provider), notifier);

            cli::convert::run(&session, &request, config.decimals).await
        }
    }
}
