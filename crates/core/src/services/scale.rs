use crate::models::geometry::Rect;
use crate::models::series::NormalizedSeries;
use crate::services::interaction::IndexResolver;
use crate::services::overlay::CoordinateMapper;

/// Evenly spaced category x-axis with a linear price y-axis.
///
/// This matches a line chart whose x-axis is the label array: sample `i`
/// sits at `left + i * step` regardless of its timestamp. Hosts whose
/// renderer exposes its own scales can implement `CoordinateMapper` and
/// `IndexResolver` directly instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    plot: Rect,
    len: usize,
    min_price: f64,
    max_price: f64,
}

impl LinearScale {
    pub fn new(plot: Rect, len: usize, min_price: f64, max_price: f64) -> Self {
        Self {
            plot,
            len,
            min_price: min_price.min(max_price),
            max_price: max_price.max(min_price),
        }
    }

    /// Fit the price axis to the series' close range, padded by
    /// `padding_ratio` of the range on both sides.
    pub fn fit(series: &NormalizedSeries, plot: Rect, padding_ratio: f64) -> Self {
        let (min, max) = series
            .samples()
            .iter()
            .map(|s| s.close)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        if !min.is_finite() || !max.is_finite() {
            return Self::new(plot, series.len(), 0.0, 1.0);
        }
        let pad = (max - min) * padding_ratio.max(0.0);
        Self::new(plot, series.len(), min - pad, max + pad)
    }

    fn step(&self) -> f64 {
        if self.len < 2 {
            0.0
        } else {
            self.plot.width / (self.len - 1) as f64
        }
    }
}

impl CoordinateMapper for LinearScale {
    fn index_to_x(&self, index: usize) -> f64 {
        self.plot.left() + index as f64 * self.step()
    }

    fn price_to_y(&self, price: f64) -> f64 {
        let span = self.max_price - self.min_price;
        if span <= f64::EPSILON {
            return self.plot.top() + self.plot.height / 2.0;
        }
        self.plot.bottom() - (price - self.min_price) / span * self.plot.height
    }

    fn plot_area(&self) -> Rect {
        self.plot
    }
}

impl IndexResolver for LinearScale {
    fn nearest_index(&self, x: f64, y: f64) -> Option<usize> {
        if self.len == 0 || !self.plot.contains(x, y) {
            return None;
        }
        let step = self.step();
        if step == 0.0 {
            return Some(0);
        }
        let index = ((x - self.plot.left()) / step).round() as usize;
        Some(index.min(self.len - 1))
    }
}
