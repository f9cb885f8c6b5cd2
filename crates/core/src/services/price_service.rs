use tracing::{info, warn};

use crate::errors::ChartError;
use crate::models::chart::FetchRequest;
use crate::models::period::FetchWindow;
use crate::models::sample::Sample;
use crate::providers::registry::PriceProviderRegistry;
use crate::providers::traits::normalize_ticker;

/// Fetches price bars from the registered providers.
///
/// Providers are tried in registration order; if the primary fails (API
/// down, rate limited, unsupported bar size), the next one is tried. There
/// is no retry loop beyond that single pass.
pub struct PriceService {
    registry: PriceProviderRegistry,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn has_providers(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Names of all providers, in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Resolve a chart fetch request.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Sample>, ChartError> {
        self.get_prices(&request.ticker, &request.window).await
    }

    /// Fetch bars for `ticker` over `window`, sorted ascending by timestamp.
    ///
    /// Samples with non-finite or negative prices are dropped.
    pub async fn get_prices(
        &self,
        ticker: &str,
        window: &FetchWindow,
    ) -> Result<Vec<Sample>, ChartError> {
        let ticker = normalize_ticker(ticker)?;
        if window.from > window.to {
            return Err(ChartError::InvalidRange(format!(
                "'from' date ({}) must not be after 'to' date ({})",
                window.from, window.to
            )));
        }
        if self.registry.is_empty() {
            return Err(ChartError::NoProvider(
                "no API key configured for any provider".into(),
            ));
        }

        let mut last_error = None;
        for provider in self.registry.providers() {
            info!(
                provider = provider.name(),
                %ticker,
                from = %window.from,
                to = %window.to,
                timespan = %window.timespan,
                multiplier = window.multiplier,
                "fetching prices"
            );
            match provider
                .get_prices(
                    &ticker,
                    window.from,
                    window.to,
                    window.timespan,
                    window.multiplier,
                )
                .await
            {
                Ok(samples) => {
                    let total = samples.len();
                    let samples: Vec<Sample> = samples
                        .into_iter()
                        .filter(Sample::has_valid_prices)
                        .collect();
                    if samples.len() != total {
                        warn!(
                            provider = provider.name(),
                            dropped = total - samples.len(),
                            "provider returned invalid prices"
                        );
                    }
                    info!(provider = provider.name(), count = samples.len(), "prices fetched");
                    return Ok(samples);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChartError::NoProvider(ticker)))
    }
}
