use thiserror::Error;

/// Unified error type for the entire stock-chart-core library.
/// Every fallible public function returns `Result<T, ChartError>`.
///
/// Errors only exist at the provider and configuration boundary. The chart
/// itself never fails: fetch errors degrade into `ChartView::Error` and
/// pointer events that cannot be resolved are ignored.
#[derive(Debug, Error)]
pub enum ChartError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No price provider available: {0}")]
    NoProvider(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Input validation ────────────────────────────────────────────
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        ChartError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for ChartError {
    fn from(e: reqwest::Error) -> Self {
        // API keys travel as query parameters, so never keep the query string.
        let msg = e.to_string();
        ChartError::Network(redact_query(&msg))
    }
}

/// Strip everything after the first `?` in a message that may embed a URL.
pub(crate) fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}
