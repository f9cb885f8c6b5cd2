use serde::{Deserialize, Serialize};

use crate::models::geometry::{Point, Rect};
use crate::models::series::{NormalizedSeries, PriceChange, SelectionRange};
use crate::models::settings::{OverlayStyle, Rgba};

/// Data-to-pixel mapping supplied by the chart renderer.
///
/// Queried on every paint. Layout can change between frames (resize), so
/// nothing derived from it is kept.
pub trait CoordinateMapper {
    fn index_to_x(&self, index: usize) -> f64;
    fn price_to_y(&self, price: f64) -> f64;
    fn plot_area(&self) -> Rect;
}

/// Minimal 2D drawing surface the overlay paints on.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Rgba);
    /// `origin` is the top-left corner of the text box.
    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, color: Rgba);
    fn measure_text(&self, text: &str, font_size: f64) -> f64;
}

/// Pixel layout of one selection overlay frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    pub band: Rect,
    pub start: Point,
    pub end: Point,
    pub tooltip: Rect,
    pub text_origin: Point,
    pub text: String,
    pub change: PriceChange,
    pub color: Rgba,
}

/// Lay out the selection overlay for `range`.
///
/// Returns `None` when there is nothing to draw: no range, or indices that
/// no longer fit the series.
pub fn layout(
    range: Option<SelectionRange>,
    series: &NormalizedSeries,
    mapper: &dyn CoordinateMapper,
    style: &OverlayStyle,
    measure: impl Fn(&str, f64) -> f64,
) -> Option<OverlayGeometry> {
    let range = range?;
    let change = range.price_change(series)?;
    let plot = mapper.plot_area();
    let (lo, hi) = range.ordered();

    let band = Rect::from_edges(
        mapper.index_to_x(lo),
        plot.top(),
        mapper.index_to_x(hi),
        plot.bottom(),
    );
    let start = Point::new(
        mapper.index_to_x(range.start_index),
        mapper.price_to_y(change.start_price),
    );
    let end = Point::new(
        mapper.index_to_x(range.end_index),
        mapper.price_to_y(change.end_price),
    );

    let text = change.tooltip_text();
    let pad = style.tooltip_padding;
    let width = measure(&text, style.tooltip_font_size) + 2.0 * pad;
    let height = style.tooltip_font_size + 2.0 * pad;

    // Centered over the band, kept inside the plot horizontally and above
    // the higher of the two endpoints.
    let center_x = band.x + band.width / 2.0;
    let max_x = (plot.right() - width).max(plot.left());
    let x = (center_x - width / 2.0).clamp(plot.left(), max_x);
    let y = (start.y.min(end.y) - style.tooltip_offset - height).max(plot.top());
    let tooltip = Rect::new(x, y, width, height);

    let color = if change.is_gain() {
        style.rise_color
    } else {
        style.fall_color
    };

    Some(OverlayGeometry {
        band,
        start,
        end,
        tooltip,
        text_origin: Point::new(x + pad, y + pad),
        text,
        change,
        color,
    })
}

/// Draw the selection overlay: translucent band, directional connector,
/// endpoint markers and the delta tooltip.
pub fn paint(
    range: Option<SelectionRange>,
    series: &NormalizedSeries,
    mapper: &dyn CoordinateMapper,
    style: &OverlayStyle,
    canvas: &mut dyn Canvas,
) -> Option<OverlayGeometry> {
    let geometry = layout(range, series, mapper, style, |text, size| {
        canvas.measure_text(text, size)
    })?;

    canvas.fill_rect(geometry.band, geometry.color.with_alpha(style.band_alpha));
    canvas.stroke_line(
        geometry.start,
        geometry.end,
        style.connector_width,
        geometry.color,
    );
    canvas.fill_circle(geometry.start, style.marker_radius, geometry.color);
    canvas.fill_circle(geometry.end, style.marker_radius, geometry.color);
    canvas.fill_rounded_rect(
        geometry.tooltip,
        style.tooltip_corner_radius,
        style.tooltip_background,
    );
    canvas.fill_text(
        &geometry.text,
        geometry.text_origin,
        style.tooltip_font_size,
        style.tooltip_text,
    );

    Some(geometry)
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    FillRect {
        rect: Rect,
        color: Rgba,
    },
    StrokeLine {
        from: Point,
        to: Point,
        width: f64,
        color: Rgba,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    FillRoundedRect {
        rect: Rect,
        radius: f64,
        color: Rgba,
    },
    FillText {
        text: String,
        origin: Point,
        font_size: f64,
        color: Rgba,
    },
}

/// Canvas that records draw calls instead of rasterizing them.
///
/// Hosts without a native canvas can replay the commands; tests assert on
/// them. Text width is estimated at 0.6 em per character.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for RecordingCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Rgba) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            width,
            color,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Rgba) {
        self.commands
            .push(DrawCommand::FillRoundedRect { rect, radius, color });
    }

    fn fill_text(&mut self, text: &str, origin: Point, font_size: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            origin,
            font_size,
            color,
        });
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * 0.6
    }
}
