use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ChartError;

/// The chart's time window selector.
///
/// Exactly one period is active at a time. It decides what gets fetched
/// (window and bar size), how dense the resampled series is, and how axis
/// labels are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl Period {
    /// All periods in the order they appear in the period picker.
    pub const ALL: [Period; 7] = [
        Period::OneDay,
        Period::OneWeek,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::YearToDate,
        Period::OneYear,
        Period::FiveYears,
    ];

    /// Short code shown on the period picker ("1D", "YTD", ...).
    pub fn code(&self) -> &'static str {
        match self {
            Period::OneDay => "1D",
            Period::OneWeek => "1W",
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::YearToDate => "YTD",
            Period::OneYear => "1Y",
            Period::FiveYears => "5Y",
        }
    }

    /// Bar size used when fetching this period.
    pub fn bar_size(&self) -> (Timespan, u32) {
        match self {
            Period::OneDay => (Timespan::Minute, 5),
            Period::OneWeek => (Timespan::Hour, 1),
            Period::OneMonth | Period::ThreeMonths | Period::YearToDate | Period::OneYear => {
                (Timespan::Day, 1)
            }
            Period::FiveYears => (Timespan::Week, 1),
        }
    }

    /// Compute the fetch window ending on `now`'s UTC date.
    pub fn fetch_window(&self, now: DateTime<Utc>) -> FetchWindow {
        let to = now.date_naive();
        let from = match self {
            Period::OneDay => to - Duration::days(1),
            Period::OneWeek => to - Duration::days(7),
            Period::OneMonth => months_back(to, 1),
            Period::ThreeMonths => months_back(to, 3),
            Period::YearToDate => NaiveDate::from_ymd_opt(to.year(), 1, 1).unwrap_or(to),
            Period::OneYear => months_back(to, 12),
            Period::FiveYears => months_back(to, 60),
        };
        let (timespan, multiplier) = self.bar_size();
        FetchWindow {
            from,
            to,
            timespan,
            multiplier,
        }
    }

    /// `chrono` format string for axis labels.
    pub fn label_format(&self) -> &'static str {
        match self {
            Period::OneDay => "%-I:%M %p",
            Period::OneWeek => "%a %-d",
            Period::OneMonth | Period::ThreeMonths | Period::YearToDate => "%b %-d",
            Period::OneYear => "%b '%y",
            Period::FiveYears => "%b %Y",
        }
    }

    /// `chrono` format string for the date range of a selection.
    pub fn range_format(&self) -> &'static str {
        match self {
            Period::OneDay => "%-I:%M %p",
            Period::OneWeek => "%a %b %-d, %-I:%M %p",
            _ => "%b %-d, %Y",
        }
    }
}

fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or_else(|| date - Duration::days(i64::from(months) * 30))
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Period {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Period::ALL
            .into_iter()
            .find(|p| p.code() == upper)
            .ok_or_else(|| ChartError::InvalidRange(format!("Unknown period '{s}'")))
    }
}

/// Bar size unit understood by the price providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timespan {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl Timespan {
    /// Path segment used by the Polygon aggregates endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
            Timespan::Week => "week",
            Timespan::Month => "month",
        }
    }

    /// Finnhub candle resolution, if Finnhub supports this bar size.
    pub fn finnhub_resolution(&self, multiplier: u32) -> Option<&'static str> {
        match (self, multiplier) {
            (Timespan::Minute, 1) => Some("1"),
            (Timespan::Minute, 5) => Some("5"),
            (Timespan::Minute, 15) => Some("15"),
            (Timespan::Minute, 30) => Some("30"),
            (Timespan::Minute, 60) | (Timespan::Hour, 1) => Some("60"),
            (Timespan::Day, 1) => Some("D"),
            (Timespan::Week, 1) => Some("W"),
            (Timespan::Month, 1) => Some("M"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Timespan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to ask a price provider for: a date range and a bar size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub timespan: Timespan,
    pub multiplier: u32,
}
