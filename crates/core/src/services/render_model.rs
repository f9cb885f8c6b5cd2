use chrono::DateTime;
use chrono_tz::Tz;

use crate::models::chart::RenderModel;
use crate::models::period::Period;
use crate::models::series::{NormalizedSeries, PriceChange};

/// Format a millisecond timestamp in `tz` with a `chrono` format string.
/// Unrepresentable timestamps format as an empty label.
pub fn format_timestamp(timestamp: i64, format: &str, tz: Tz) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.with_timezone(&tz).format(format).to_string())
        .unwrap_or_default()
}

/// Turn a normalized series into the label/value arrays a line chart
/// renderer consumes, plus the first-to-last change for the header.
///
/// Deterministic and non-mutating: the same inputs always produce the same
/// model.
pub fn build_series(series: &NormalizedSeries, period: Period, tz: Tz) -> RenderModel {
    let format = period.label_format();
    let (labels, values) = series
        .samples()
        .iter()
        .map(|s| (format_timestamp(s.timestamp, format, tz), s.close))
        .unzip();

    RenderModel {
        labels,
        values,
        change: overall_change(series),
    }
}

/// `last.close - first.close` and its percentage, when there is a line to
/// speak of.
pub fn overall_change(series: &NormalizedSeries) -> Option<PriceChange> {
    if !series.is_sufficient() {
        return None;
    }
    let first = series.first()?;
    let last = series.last()?;
    Some(PriceChange::between(first.close, last.close))
}
