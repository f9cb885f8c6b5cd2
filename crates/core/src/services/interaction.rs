use chrono_tz::Tz;
use tracing::debug;

use crate::models::interaction::{InteractionState, PointerEvent};
use crate::models::period::Period;
use crate::models::series::{NormalizedSeries, SelectionRange, SelectionSummary};
use crate::services::render_model::format_timestamp;

/// Maps a pointer position to the nearest sample index.
///
/// Supplied by whatever draws the chart. Returning `None` means the pointer
/// is outside the plot area.
pub trait IndexResolver {
    fn nearest_index(&self, x: f64, y: f64) -> Option<usize>;
}

impl<F> IndexResolver for F
where
    F: Fn(f64, f64) -> Option<usize>,
{
    fn nearest_index(&self, x: f64, y: f64) -> Option<usize> {
        self(x, y)
    }
}

/// Hover/drag/selection state machine for the price chart.
///
/// Holds no pixel geometry, only indices into the current
/// `NormalizedSeries`, so it can be driven entirely from tests.
///
/// Gestures:
/// - press, move, release across two or more samples commits a selection;
/// - press and release on one sample commits nothing, and the click that
///   follows clears any committed selection;
/// - leaving the chart cancels a drag in progress but keeps a committed
///   selection.
#[derive(Debug, Clone, Default)]
pub struct InteractionMachine {
    state: InteractionState,
    selection: Option<SelectionRange>,
    /// Last hover written, used to skip redundant updates.
    last_hover: Option<(usize, f64)>,
    /// Position of the release that committed the current selection. The
    /// click the host fires for that same release must not clear it.
    commit_release: Option<(f64, f64)>,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    /// Back to a clean idle state with no selection. Called on every period
    /// change and every series rebuild.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Commit a selection programmatically. Out-of-range indices are ignored.
    pub fn select(&mut self, range: SelectionRange, series: &NormalizedSeries) -> bool {
        if !range.is_within(series.len()) {
            return false;
        }
        self.selection = Some(range);
        self.state = InteractionState::Idle;
        self.last_hover = None;
        self.commit_release = None;
        true
    }

    /// The range the overlay should draw: the drag in progress once it has
    /// moved off its first sample, otherwise the committed selection.
    pub fn active_range(&self) -> Option<SelectionRange> {
        match self.state {
            InteractionState::Dragging { start, current } if start != current => {
                Some(SelectionRange::new(start, current))
            }
            _ => self.selection,
        }
    }

    /// Feed one pointer event. Returns `true` when the visible state changed
    /// and the chart needs a redraw.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        series: &NormalizedSeries,
        resolver: &dyn IndexResolver,
    ) -> bool {
        match event {
            PointerEvent::Down { x, y } => self.on_down(x, y, series, resolver),
            PointerEvent::Move { x, y } => self.on_move(x, y, series, resolver),
            PointerEvent::Up { x, y } => self.on_up(x, y, series, resolver),
            PointerEvent::Leave => self.on_leave(),
            PointerEvent::Click { x, y } => self.on_click(x, y),
        }
    }

    fn on_down(
        &mut self,
        x: f64,
        y: f64,
        series: &NormalizedSeries,
        resolver: &dyn IndexResolver,
    ) -> bool {
        self.commit_release = None;
        let Some(index) = resolve(resolver, x, y, series) else {
            return false;
        };
        debug!(index, "drag started");
        self.state = InteractionState::Dragging {
            start: index,
            current: index,
        };
        self.last_hover = None;
        true
    }

    fn on_move(
        &mut self,
        x: f64,
        y: f64,
        series: &NormalizedSeries,
        resolver: &dyn IndexResolver,
    ) -> bool {
        let Some(index) = resolve(resolver, x, y, series) else {
            return false;
        };

        match self.state {
            InteractionState::Dragging { start, current } => {
                if index == current {
                    return false;
                }
                self.state = InteractionState::Dragging {
                    start,
                    current: index,
                };
                true
            }
            InteractionState::Idle | InteractionState::Hovering(_) => {
                let price = series.close_at(index).unwrap_or_default();
                if self.last_hover == Some((index, price)) {
                    return false;
                }
                self.last_hover = Some((index, price));
                self.state = InteractionState::Hovering(index);
                true
            }
        }
    }

    fn on_up(
        &mut self,
        x: f64,
        y: f64,
        series: &NormalizedSeries,
        resolver: &dyn IndexResolver,
    ) -> bool {
        let InteractionState::Dragging { start, current } = self.state else {
            return false;
        };
        let end = resolve(resolver, x, y, series).unwrap_or(current);
        self.state = InteractionState::Idle;

        if start == end {
            // A plain click; the click event decides what happens.
            return true;
        }

        let range = SelectionRange::new(start, end);
        debug!(start, end, "selection committed");
        self.selection = Some(range);
        self.commit_release = Some((x, y));
        true
    }

    fn on_leave(&mut self) -> bool {
        let changed = self.state != InteractionState::Idle;
        if self.state.is_dragging() {
            debug!("drag cancelled by pointer leave");
        }
        self.state = InteractionState::Idle;
        self.last_hover = None;
        self.commit_release = None;
        changed
    }

    fn on_click(&mut self, x: f64, y: f64) -> bool {
        if self.commit_release.take() == Some((x, y)) {
            return false;
        }
        if self.selection.is_none() {
            return false;
        }
        debug!("selection cleared by click");
        self.selection = None;
        self.state = InteractionState::Idle;
        self.last_hover = None;
        true
    }

    /// Header data for the active range, or `None` when nothing is selected.
    pub fn summary(
        &self,
        series: &NormalizedSeries,
        period: Period,
        tz: Tz,
    ) -> Option<SelectionSummary> {
        summarize(self.active_range()?, series, period, tz)
    }
}

/// Price change in drag order, dates in chronological order.
pub fn summarize(
    range: SelectionRange,
    series: &NormalizedSeries,
    period: Period,
    tz: Tz,
) -> Option<SelectionSummary> {
    let change = range.price_change(series)?;
    let (lo, hi) = range.ordered();
    let from_timestamp = series.timestamp_at(lo)?;
    let to_timestamp = series.timestamp_at(hi)?;
    let format = period.range_format();
    Some(SelectionSummary {
        change,
        from_timestamp,
        to_timestamp,
        from_label: format_timestamp(from_timestamp, format, tz),
        to_label: format_timestamp(to_timestamp, format, tz),
    })
}

/// Resolve a pointer position, treating anything outside the series as a
/// miss. Pointer events can race an in-flight series rebuild.
fn resolve(
    resolver: &dyn IndexResolver,
    x: f64,
    y: f64,
    series: &NormalizedSeries,
) -> Option<usize> {
    resolver
        .nearest_index(x, y)
        .filter(|index| *index < series.len())
}
