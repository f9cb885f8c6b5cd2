use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration as StdDuration;

use super::traits::PriceProvider;
use crate::errors::ChartError;
use crate::models::period::Timespan;
use crate::models::sample::Sample;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER: &str = "Finnhub";

/// Finnhub stock candles provider.
///
/// - **Requires**: API key (set via settings as "finnhub").
/// - **Resolutions**: 1, 5, 15, 30, 60 minutes, D, W, M.
/// - **Timestamps**: Unix seconds (converted to milliseconds here).
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(StdDuration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Unix-second bounds covering `from` 00:00:00 to `to` 23:59:59 UTC.
    pub(crate) fn unix_bounds(from: NaiveDate, to: NaiveDate) -> (i64, i64) {
        let start = from.and_hms_opt(0, 0, 0).map_or(0, |dt| dt.and_utc().timestamp());
        let end = (to + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .map_or(start, |dt| dt.and_utc().timestamp() - 1);
        (start, end)
    }
}

// ── Finnhub API response types ──────────────────────────────────────

/// Candles come back as parallel arrays plus a status flag.
#[derive(Debug, Deserialize)]
pub(crate) struct CandleResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

impl CandleResponse {
    pub(crate) fn into_samples(self, ticker: &str) -> Result<Vec<Sample>, ChartError> {
        match self.s.as_str() {
            "ok" => {}
            "no_data" => return Ok(Vec::new()),
            other => {
                return Err(ChartError::Api {
                    provider: PROVIDER.into(),
                    message: format!("Unexpected candle status '{other}' for {ticker}"),
                })
            }
        }

        let n = self.t.len();
        if [self.o.len(), self.h.len(), self.l.len(), self.c.len()]
            .iter()
            .any(|len| *len != n)
        {
            return Err(ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("Candle arrays for {ticker} have mismatched lengths"),
            });
        }

        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let timestamp = self.t[i].checked_mul(1000).ok_or_else(|| ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("Candle timestamp {} for {ticker} is out of range", self.t[i]),
            })?;
            samples.push(Sample::new(
                timestamp,
                self.o[i],
                self.h[i],
                self.l[i],
                self.c[i],
                self.v.get(i).copied().unwrap_or(0.0),
            ));
        }
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        Ok(samples)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for FinnhubProvider {
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
        let resolution = timespan
            .finnhub_resolution(multiplier)
            .ok_or_else(|| ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("Unsupported bar size {multiplier} {timespan}"),
            })?;
        let (start, end) = Self::unix_bounds(from, to);

        let body: CandleResponse = self
            .client
            .get(format!("{}/stock/candle", self.base_url))
            .query(&[
                ("symbol", ticker.to_uppercase()),
                ("resolution", resolution.to_string()),
                ("from", start.to_string()),
                ("to", end.to_string()),
                ("token", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| ChartError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse candles for {ticker}: {e}"),
            })?;

        body.into_samples(ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_bounds_cover_whole_days() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let (start, end) = FinnhubProvider::unix_bounds(from, to);
        assert_eq!(start, 1_704_067_200);
        assert_eq!(end, 1_704_067_200 + 2 * 86_400 - 1);
    }

    #[test]
    fn parses_parallel_arrays() {
        let json = r#"{"s":"ok","t":[20,10],"o":[2,1],"h":[3,2],"l":[1,0.5],"c":[2.5,1.5],"v":[7,8]}"#;
        let body: CandleResponse = serde_json::from_str(json).unwrap();
        let samples = body.into_samples("MSFT").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, 10_000);
        assert_eq!(samples[0].close, 1.5);
        assert_eq!(samples[1].volume, 7.0);
    }

    #[test]
    fn no_data_is_empty() {
        let body: CandleResponse = serde_json::from_str(r#"{"s":"no_data"}"#).unwrap();
        assert!(body.into_samples("MSFT").unwrap().is_empty());
    }

    #[test]
    fn mismatched_arrays_rejected() {
        let json = r#"{"s":"ok","t":[1,2],"o":[1],"h":[1,2],"l":[1,2],"c":[1,2]}"#;
        let body: CandleResponse = serde_json::from_str(json).unwrap();
        assert!(body.into_samples("MSFT").is_err());
    }

    #[test]
    fn out_of_range_timestamp_rejected() {
        let json = r#"{"s":"ok","t":[9223372036854776],"o":[1],"h":[1],"l":[1],"c":[1]}"#;
        let body: CandleResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            body.into_samples("MSFT"),
            Err(ChartError::Api { .. })
        ));
    }
}
