use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::period::Period;
use crate::errors::ChartError;

/// Default number of points the chart resamples every series to.
pub const DEFAULT_TARGET_POINTS: usize = 110;

/// Upper bound for `jitter_ratio`; anything larger would visibly distort
/// the synthetic candles.
pub const MAX_JITTER_RATIO: f64 = 0.1;

/// User-configurable chart settings.
///
/// Every field has a default so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Resampling density. Must be at least 2.
    pub target_points: usize,

    /// Per-period density overrides, e.g. `{"5Y": 160}`.
    pub period_targets: HashMap<Period, usize>,

    /// Bound of the cosmetic high/low jitter on synthetic points, as a
    /// fraction of the interpolated price.
    pub jitter_ratio: f64,

    /// Seed for the jitter generator. `None` draws a seed from the OS, which
    /// makes synthetic candles differ between rebuilds.
    pub jitter_seed: Option<u64>,

    /// Time zone used to format axis labels and selection dates.
    pub timezone: Tz,

    /// API keys for providers that require them.
    /// Keys: provider name ("polygon", "finnhub").
    pub api_keys: HashMap<String, String>,

    pub overlay: OverlayStyle,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            target_points: DEFAULT_TARGET_POINTS,
            period_targets: HashMap::new(),
            jitter_ratio: 0.002,
            jitter_seed: Some(0x5EED),
            timezone: chrono_tz::America::New_York,
            api_keys: HashMap::new(),
            overlay: OverlayStyle::default(),
        }
    }
}

impl ChartSettings {
    /// Parse and validate settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        let settings: ChartSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if self.target_points < 2 {
            return Err(ChartError::Config(format!(
                "target_points must be at least 2, got {}",
                self.target_points
            )));
        }
        if let Some((period, target)) = self.period_targets.iter().find(|(_, t)| **t < 2) {
            return Err(ChartError::Config(format!(
                "period_targets[{period}] must be at least 2, got {target}"
            )));
        }
        if !self.jitter_ratio.is_finite()
            || self.jitter_ratio < 0.0
            || self.jitter_ratio > MAX_JITTER_RATIO
        {
            return Err(ChartError::Config(format!(
                "jitter_ratio must be within [0, {MAX_JITTER_RATIO}], got {}",
                self.jitter_ratio
            )));
        }
        self.overlay.validate()
    }
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Colors and metrics of the selection overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub rise_color: Rgba,
    pub fall_color: Rgba,
    pub band_alpha: f32,
    pub connector_width: f64,
    pub marker_radius: f64,
    pub tooltip_background: Rgba,
    pub tooltip_text: Rgba,
    pub tooltip_font_size: f64,
    pub tooltip_padding: f64,
    pub tooltip_corner_radius: f64,
    /// Gap between the higher endpoint and the bottom of the tooltip.
    pub tooltip_offset: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            rise_color: Rgba::new(0.13, 0.77, 0.37, 1.0),
            fall_color: Rgba::new(0.94, 0.27, 0.27, 1.0),
            band_alpha: 0.15,
            connector_width: 3.0,
            marker_radius: 5.0,
            tooltip_background: Rgba::new(0.07, 0.09, 0.15, 0.9),
            tooltip_text: Rgba::new(1.0, 1.0, 1.0, 1.0),
            tooltip_font_size: 12.0,
            tooltip_padding: 6.0,
            tooltip_corner_radius: 4.0,
            tooltip_offset: 12.0,
        }
    }
}

impl OverlayStyle {
    fn validate(&self) -> Result<(), ChartError> {
        let metrics = [
            ("connector_width", self.connector_width),
            ("marker_radius", self.marker_radius),
            ("tooltip_font_size", self.tooltip_font_size),
            ("tooltip_padding", self.tooltip_padding),
            ("tooltip_corner_radius", self.tooltip_corner_radius),
            ("tooltip_offset", self.tooltip_offset),
        ];
        for (name, value) in metrics {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::Config(format!(
                    "overlay.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.band_alpha) {
            return Err(ChartError::Config(format!(
                "overlay.band_alpha must be within [0, 1], got {}",
                self.band_alpha
            )));
        }
        Ok(())
    }
}
