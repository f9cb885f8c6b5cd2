use serde::{Deserialize, Serialize};

use super::sample::Sample;

/// The resampled series the chart actually draws.
///
/// Rebuilt from scratch whenever the ticker or period changes, never
/// mutated in place. Points created by upsampling are flagged as synthetic:
/// their high/low carry cosmetic jitter and are not real extrema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    samples: Vec<Sample>,
    synthetic: Vec<bool>,
}

impl NormalizedSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap real samples without any resampling.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let synthetic = vec![false; samples.len()];
        Self { samples, synthetic }
    }

    pub(crate) fn with_flags(samples: Vec<Sample>, synthetic: Vec<bool>) -> Self {
        debug_assert_eq!(samples.len(), synthetic.len());
        Self { samples, synthetic }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fewer than two points cannot be drawn as a line; the chart shows an
    /// "insufficient data" state instead.
    pub fn is_sufficient(&self) -> bool {
        self.samples.len() >= 2
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Close price at `index`; this is the price the chart plots.
    pub fn close_at(&self, index: usize) -> Option<f64> {
        self.samples.get(index).map(|s| s.close)
    }

    pub fn timestamp_at(&self, index: usize) -> Option<i64> {
        self.samples.get(index).map(|s| s.timestamp)
    }

    pub fn is_synthetic(&self, index: usize) -> bool {
        self.synthetic.get(index).copied().unwrap_or(false)
    }

    /// Number of real (non-interpolated) samples kept in the series.
    pub fn real_count(&self) -> usize {
        self.synthetic.iter().filter(|s| !**s).count()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// A committed drag selection, as indices into a `NormalizedSeries`.
///
/// `start_index` is where the drag began, so it may be greater than
/// `end_index` after a backward drag. Anything that draws or prints dates
/// must go through `ordered()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl SelectionRange {
    pub fn new(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    /// `(min, max)` of the two indices.
    pub fn ordered(&self) -> (usize, usize) {
        (
            self.start_index.min(self.end_index),
            self.start_index.max(self.end_index),
        )
    }

    pub fn is_within(&self, len: usize) -> bool {
        self.start_index < len && self.end_index < len
    }

    pub fn is_backward(&self) -> bool {
        self.start_index > self.end_index
    }

    /// Directional price change from the drag start to the drag end.
    pub fn price_change(&self, series: &NormalizedSeries) -> Option<PriceChange> {
        let start = series.close_at(self.start_index)?;
        let end = series.close_at(self.end_index)?;
        Some(PriceChange::between(start, end))
    }
}

/// Price movement between two points, in drag (or chronological) order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub start_price: f64,
    pub end_price: f64,
    pub delta: f64,
    /// Percentage relative to `start_price`; 0 when the start price is 0.
    pub percent: f64,
}

impl PriceChange {
    pub fn between(start_price: f64, end_price: f64) -> Self {
        let delta = end_price - start_price;
        let percent = if start_price == 0.0 {
            0.0
        } else {
            delta / start_price * 100.0
        };
        Self {
            start_price,
            end_price,
            delta,
            percent,
        }
    }

    /// Rising or flat moves count as gains (drawn green).
    pub fn is_gain(&self) -> bool {
        self.end_price >= self.start_price
    }

    /// `"10.00 → 8.00: -2.00 (-20.00%)"`
    pub fn tooltip_text(&self) -> String {
        format!(
            "{:.2} → {:.2}: {:+.2} ({:+.2}%)",
            self.start_price, self.end_price, self.delta, self.percent
        )
    }
}

/// Everything the header shows for the active selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub change: PriceChange,
    /// Earlier of the two selected timestamps (ms).
    pub from_timestamp: i64,
    /// Later of the two selected timestamps (ms).
    pub to_timestamp: i64,
    pub from_label: String,
    pub to_label: String,
}

impl SelectionSummary {
    pub fn date_range_text(&self) -> String {
        format!("{} – {}", self.from_label, self.to_label)
    }
}
