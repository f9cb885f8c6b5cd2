use serde::{Deserialize, Serialize};

use super::period::{FetchWindow, Period};
use super::series::PriceChange;

/// Axis-labelled line series handed to the chart renderer.
///
/// The core computes all the numbers — the renderer only draws them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderModel {
    /// One label per sample, formatted for the active period.
    pub labels: Vec<String>,

    /// One close price per sample.
    pub values: Vec<f64>,

    /// Overall first-to-last change for the header. Informational only,
    /// not part of the chart geometry. `None` with fewer than two samples.
    pub change: Option<PriceChange>,
}

impl RenderModel {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What the chart area should display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartView {
    /// No ticker selected yet.
    Empty,
    Loading,
    /// The last fetch failed; previous data has been cleared.
    Error(String),
    /// Fewer than two points came back. Terminal, not retried.
    InsufficientData,
    Ready(RenderModel),
}

/// One price fetch issued by the chart.
///
/// `token` increases monotonically per chart; only the response carrying
/// the latest token is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub token: u64,
    pub ticker: String,
    pub period: Period,
    pub window: FetchWindow,
}
