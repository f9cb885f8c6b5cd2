use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::ChartError;
use crate::models::period::Timespan;
use crate::models::sample::Sample;

/// Trait abstraction for market-data providers.
///
/// Each API (Polygon, Finnhub) implements this trait. The chart only ever
/// sees `Sample`s, so swapping or adding a provider touches nothing else.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch OHLCV bars for `ticker` between `from` and `to` (inclusive),
    /// with bars of `multiplier` × `timespan`.
    ///
    /// Returns samples sorted ascending by timestamp. An empty vector means
    /// the provider has no data for the window, which is not an error.
    async fn get_prices(
        &self,
        ticker: &str,
        from: NaiveDate,
        to: NaiveDate,
        timespan: Timespan,
        multiplier: u32,
    ) -> Result<Vec<Sample>, ChartError>;
}

/// Validate and normalize a ticker symbol (trimmed, uppercased).
///
/// Accepts 1 to 10 ASCII alphanumerics, `.` or `-` (e.g. "AAPL", "BRK.B").
pub fn normalize_ticker(ticker: &str) -> Result<String, ChartError> {
    let trimmed = ticker.trim().to_uppercase();
    if trimmed.is_empty() || trimmed.len() > 10 {
        return Err(ChartError::InvalidTicker(format!(
            "'{ticker}' must be 1 to 10 characters"
        )));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ChartError::InvalidTicker(format!(
            "'{ticker}' contains unsupported characters"
        )));
    }
    Ok(trimmed)
}
