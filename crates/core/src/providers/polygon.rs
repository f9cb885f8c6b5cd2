use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::PriceProvider;
use crate::errors::ChartError;
use crate::models::period::Timespan;
use crate::models::sample::Sample;

const BASE_URL: &str = "https://api.polygon.io";
const PROVIDER: &str = "Polygon";

/// Polygon.io aggregates (bars) provider.
///
/// - **Requires**: API key (set via settings as "polygon").
/// - **Coverage**: US equities, intraday down to 1 minute.
/// - **Free tier**: 5 requests/minute, end-of-day delayed data.
pub struct PolygonProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl PolygonProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    /// Point the provider at another host (proxy or test server).
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn aggregates_url(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        timespan: Timespan,
        multiplier: u32,
    ) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            ticker.to_uppercase(),
            multiplier,
            timespan.as_str(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        )
    }
}

// ── Polygon API response types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct AggregatesResponse {
    status: Option<String>,
    #[serde(default)]
    results: Option<Vec<AggregateBar>>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

impl AggregatesResponse {
    /// Convert the response body into samples, or an API error when the
    /// status says the request was rejected.
    pub(crate) fn into_samples(self, ticker: &str) -> Result<Vec<Sample>, ChartError> {
        let status = self.status.as_deref().unwrap_or("OK");
        if !matches!(status, "OK" | "DELAYED") {
            let detail = self
                .error
                .or(self.message)
                .unwrap_or_else(|| format!("status {status}"));
            return Err(ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("Aggregates request for {ticker} rejected: {detail}"),
            });
        }

        let mut samples: Vec<Sample> = self
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|bar| Sample::new(bar.t, bar.o, bar.h, bar.l, bar.c, bar.v))
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        Ok(samples)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for PolygonProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_prices(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        timespan: Timespan,
        multiplier: u32,
    ) -> Result<Vec<Sample>, ChartError> {
        let url = self.aggregates_url(ticker, from, to, timespan, multiplier);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: AggregatesResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(ChartError::Api {
                    provider: PROVIDER.into(),
                    message: format!("HTTP {status} for {ticker}"),
                })
            }
            Err(e) => {
                return Err(ChartError::Api {
                    provider: PROVIDER.into(),
                    message: format!("Failed to parse aggregates for {ticker}: {e}"),
                })
            }
        };

        if !status.is_success() && body.status.as_deref().unwrap_or("OK") == "OK" {
            return Err(ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("HTTP {status} for {ticker}"),
            });
        }

        body.into_samples(ticker)
    }
}
