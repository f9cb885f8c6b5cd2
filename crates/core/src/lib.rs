pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::{DateTime, Utc};
use models::{
    chart::{ChartView, FetchRequest, RenderModel},
    interaction::{InteractionState, PointerEvent},
    period::Period,
    sample::Sample,
    series::{NormalizedSeries, SelectionRange, SelectionSummary},
    settings::ChartSettings,
};
use providers::traits::normalize_ticker;
use services::{
    interaction::{IndexResolver, InteractionMachine},
    normalizer::{normalize, NormalizerConfig},
    overlay::{Canvas, CoordinateMapper, OverlayGeometry},
    price_service::PriceService,
    render_model::build_series,
};
use tracing::{debug, info, warn};

use errors::ChartError;

/// Shown in place of the chart when a fetch fails. Provider detail is only
/// logged.
pub const FETCH_ERROR_MESSAGE: &str = "Unable to load price data";

/// Where the chart is in its fetch lifecycle.
#[derive(Debug, Clone, PartialEq)]
enum LoadState {
    Empty,
    Loading,
    Failed(String),
    Loaded,
}

/// Main entry point for the stock chart core.
///
/// Owns the active ticker and period, the resampled series and its render
/// model, and the interaction state. Fetching is left to the host: every
/// ticker or period change hands out a `FetchRequest`, and only the
/// response for the most recent request is applied.
#[must_use]
pub struct StockChart {
    settings: ChartSettings,
    normalizer: NormalizerConfig,
    ticker: Option<String>,
    period: Period,
    /// Token of the most recently issued request.
    latest_token: u64,
    state: LoadState,
    series: NormalizedSeries,
    model: RenderModel,
    interaction: InteractionMachine,
}

impl std::fmt::Debug for StockChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockChart")
            .field("ticker", &self.ticker)
            .field("period", &self.period)
            .field("latest_token", &self.latest_token)
            .field("state", &self.state)
            .field("points", &self.series.len())
            .field("interaction", &self.interaction.state())
            .finish()
    }
}

impl StockChart {
    /// Create an empty chart with validated settings. Starts on 1D.
    pub fn new(settings: ChartSettings) -> Result<Self, ChartError> {
        settings.validate()?;
        Ok(Self {
            normalizer: NormalizerConfig::from_settings(&settings),
            settings,
            ticker: None,
            period: Period::OneDay,
            latest_token: 0,
            state: LoadState::Empty,
            series: NormalizedSeries::empty(),
            model: RenderModel::default(),
            interaction: InteractionMachine::new(),
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    #[must_use]
    pub fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref()
    }

    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }

    #[must_use]
    pub fn series(&self) -> &NormalizedSeries {
        &self.series
    }

    #[must_use]
    pub fn render_model(&self) -> &RenderModel {
        &self.model
    }

    #[must_use]
    pub fn interaction_state(&self) -> InteractionState {
        self.interaction.state()
    }

    #[must_use]
    pub fn selection(&self) -> Option<SelectionRange> {
        self.interaction.selection()
    }

    /// The sample under the pointer while hovering, for the hover tooltip.
    #[must_use]
    pub fn hovered_sample(&self) -> Option<&Sample> {
        self.interaction
            .state()
            .hover_index()
            .and_then(|i| self.series.get(i))
    }

    /// What the chart area should display right now.
    #[must_use]
    pub fn view(&self) -> ChartView {
        match &self.state {
            LoadState::Empty => ChartView::Empty,
            LoadState::Loading => ChartView::Loading,
            LoadState::Failed(message) => ChartView::Error(message.clone()),
            LoadState::Loaded if !self.series.is_sufficient() => ChartView::InsufficientData,
            LoadState::Loaded => ChartView::Ready(self.model.clone()),
        }
    }

    fn is_interactive(&self) -> bool {
        self.state == LoadState::Loaded && self.series.is_sufficient()
    }

    // ── Fetch lifecycle ─────────────────────────────────────────────

    /// Switch to `ticker` and `period` and issue a new fetch request.
    ///
    /// Clears the current series and selection and enters the loading
    /// state. Any request issued earlier becomes stale.
    pub fn request(&mut self, ticker: &str, period: Period) -> Result<FetchRequest, ChartError> {
        self.request_at(ticker, period, Utc::now())
    }

    /// Same as `request`, with the fetch window anchored at `now`.
    pub fn request_at(
        &mut self,
        ticker: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<FetchRequest, ChartError> {
        let ticker = normalize_ticker(ticker)?;
        self.latest_token += 1;
        let request = FetchRequest {
            token: self.latest_token,
            ticker: ticker.clone(),
            period,
            window: period.fetch_window(now),
        };
        info!(%ticker, %period, token = request.token, "price request issued");

        self.ticker = Some(ticker);
        self.period = period;
        self.state = LoadState::Loading;
        self.series = NormalizedSeries::empty();
        self.model = RenderModel::default();
        self.interaction.reset();
        Ok(request)
    }

    /// Change the period. The selection and pointer state are cleared
    /// immediately. Returns the fetch request for the current ticker, or
    /// `None` if the period did not change or no ticker is selected yet.
    pub fn set_period(&mut self, period: Period) -> Option<FetchRequest> {
        self.set_period_at(period, Utc::now())
    }

    pub fn set_period_at(&mut self, period: Period, now: DateTime<Utc>) -> Option<FetchRequest> {
        if period == self.period {
            return None;
        }
        self.interaction.reset();
        self.period = period;
        let ticker = self.ticker.clone()?;
        // The ticker was validated when it was first requested.
        self.request_at(&ticker, period, now).ok()
    }

    /// Apply the outcome of the fetch identified by `token`.
    ///
    /// Responses for superseded requests are discarded and `false` is
    /// returned. A failed fetch clears the chart and shows an error.
    pub fn complete(&mut self, token: u64, result: Result<Vec<Sample>, ChartError>) -> bool {
        if token != self.latest_token || self.state != LoadState::Loading {
            warn!(token, latest = self.latest_token, "discarding stale price response");
            return false;
        }

        self.interaction.reset();
        match result {
            Ok(samples) => {
                self.series = normalize(&samples, self.period, &self.normalizer);
                self.model = build_series(&self.series, self.period, self.settings.timezone);
                self.state = LoadState::Loaded;
                debug!(
                    raw = samples.len(),
                    points = self.series.len(),
                    "series rebuilt"
                );
            }
            Err(e) => {
                warn!(error = %e, "price fetch failed");
                self.series = NormalizedSeries::empty();
                self.model = RenderModel::default();
                self.state = LoadState::Failed(FETCH_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    /// Request, fetch and apply in one go.
    pub async fn load(
        &mut self,
        service: &PriceService,
        ticker: &str,
        period: Period,
    ) -> Result<ChartView, ChartError> {
        let request = self.request(ticker, period)?;
        let result = service.fetch(&request).await;
        self.complete(request.token, result);
        Ok(self.view())
    }

    // ── Interaction ─────────────────────────────────────────────────

    /// Feed a pointer event. Inert until a drawable series is loaded.
    /// Returns `true` when the chart needs a redraw.
    pub fn handle_pointer(&mut self, event: PointerEvent, resolver: &dyn IndexResolver) -> bool {
        if !self.is_interactive() {
            return false;
        }
        self.interaction.handle(event, &self.series, resolver)
    }

    /// Commit a selection without pointer input.
    pub fn select(&mut self, range: SelectionRange) -> bool {
        self.is_interactive() && self.interaction.select(range, &self.series)
    }

    pub fn clear_selection(&mut self) {
        self.interaction.reset();
    }

    /// Price change and date range of the drag in progress or the
    /// committed selection.
    #[must_use]
    pub fn selection_summary(&self) -> Option<SelectionSummary> {
        self.interaction
            .summary(&self.series, self.period, self.settings.timezone)
    }

    /// Paint the selection overlay. Call on every redraw; positions are
    /// recomputed from `mapper` each time.
    pub fn paint(
        &self,
        mapper: &dyn CoordinateMapper,
        canvas: &mut dyn Canvas,
    ) -> Option<OverlayGeometry> {
        if !self.is_interactive() {
            return None;
        }
        services::overlay::paint(
            self.interaction.active_range(),
            &self.series,
            mapper,
            &self.settings.overlay,
            canvas,
        )
    }
}
