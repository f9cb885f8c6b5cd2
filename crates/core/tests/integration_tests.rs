// ═══════════════════════════════════════════════════════════════════
// Integration Tests — StockChart facade: fetch lifecycle, stale
// responses, period switches, pointer gestures, overlay painting
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use stock_chart_core::errors::ChartError;
use stock_chart_core::models::chart::ChartView;
use stock_chart_core::models::geometry::Rect;
use stock_chart_core::models::interaction::{InteractionState, PointerEvent};
use stock_chart_core::models::period::{Period, Timespan};
use stock_chart_core::models::sample::Sample;
use stock_chart_core::models::series::SelectionRange;
use stock_chart_core::models::settings::ChartSettings;
use stock_chart_core::providers::registry::PriceProviderRegistry;
use stock_chart_core::providers::traits::PriceProvider;
use stock_chart_core::services::overlay::RecordingCanvas;
use stock_chart_core::services::price_service::PriceService;
use stock_chart_core::services::scale::LinearScale;
use stock_chart_core::{StockChart, FETCH_ERROR_MESSAGE};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn chart() -> StockChart {
    StockChart::new(ChartSettings::default()).unwrap()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 16, 0, 0).unwrap()
}

/// `n` daily bars with a rising close.
fn bars(n: usize, base: f64) -> Vec<Sample> {
    (0..n)
        .map(|i| Sample::flat(1_704_205_800_000 + i as i64 * 86_400_000, base + i as f64))
        .collect()
}

/// Plot area sized so that sample `i` sits at x = 10 * i.
fn scale_for(chart: &StockChart) -> LinearScale {
    let width = chart.series().len().saturating_sub(1) as f64 * 10.0;
    LinearScale::fit(chart.series(), Rect::new(0.0, 0.0, width, 300.0), 0.05)
}

fn at(i: usize) -> (f64, f64) {
    (i as f64 * 10.0, 150.0)
}

fn loaded_chart() -> StockChart {
    let mut c = chart();
    let req = c.request_at("AAPL", Period::OneMonth, now()).unwrap();
    assert!(c.complete(req.token, Ok(bars(22, 100.0))));
    c
}

fn drag(c: &mut StockChart, from: usize, to: usize) {
    let scale = scale_for(c);
    let (x0, y) = at(from);
    let (x1, _) = at(to);
    c.handle_pointer(PointerEvent::Down { x: x0, y }, &scale);
    c.handle_pointer(PointerEvent::Move { x: x1, y }, &scale);
    c.handle_pointer(PointerEvent::Up { x: x1, y }, &scale);
    c.handle_pointer(PointerEvent::Click { x: x1, y }, &scale);
}

// ═══════════════════════════════════════════════════════════════════
//  Construction & views
// ═══════════════════════════════════════════════════════════════════

mod lifecycle {
    use super::*;

    #[test]
    fn starts_empty_on_one_day() {
        let c = chart();
        assert_eq!(c.view(), ChartView::Empty);
        assert_eq!(c.period(), Period::OneDay);
        assert_eq!(c.ticker(), None);
    }

    #[test]
    fn invalid_settings_rejected() {
        let settings = ChartSettings {
            target_points: 1,
            ..ChartSettings::default()
        };
        assert!(matches!(StockChart::new(settings), Err(ChartError::Config(_))));
    }

    #[test]
    fn request_enters_loading_with_window() {
        let mut c = chart();
        let req = c.request_at("msft", Period::OneWeek, now()).unwrap();
        assert_eq!(req.token, 1);
        assert_eq!(req.ticker, "MSFT");
        assert_eq!(req.window.from, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(req.window.timespan, Timespan::Hour);
        assert_eq!(c.view(), ChartView::Loading);
        assert_eq!(c.ticker(), Some("MSFT"));
    }

    #[test]
    fn invalid_ticker_leaves_chart_untouched() {
        let mut c = loaded_chart();
        assert!(c.request_at("no spaces", Period::OneDay, now()).is_err());
        assert!(matches!(c.view(), ChartView::Ready(_)));
        assert_eq!(c.ticker(), Some("AAPL"));
    }

    #[test]
    fn successful_fetch_is_ready_and_resampled() {
        let c = loaded_chart();
        let ChartView::Ready(model) = c.view() else {
            panic!("expected ready view, got {:?}", c.view());
        };
        assert_eq!(model.len(), c.series().len());
        assert!(c.series().len() > 22);
        assert_eq!(model.labels[0], "Jan 2");
        let change = model.change.unwrap();
        assert_eq!(change.start_price, 100.0);
        assert_eq!(change.end_price, 121.0);
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let mut c = chart();
        let req = c.request_at("AAPL", Period::OneDay, now()).unwrap();
        c.complete(req.token, Ok(bars(1, 10.0)));
        assert_eq!(c.view(), ChartView::InsufficientData);

        let req = c.request_at("AAPL", Period::OneWeek, now()).unwrap();
        c.complete(req.token, Ok(vec![]));
        assert_eq!(c.view(), ChartView::InsufficientData);
    }

    #[test]
    fn failed_fetch_clears_previous_chart() {
        let mut c = loaded_chart();
        let req = c.request_at("AAPL", Period::OneYear, now()).unwrap();
        c.complete(req.token, Err(ChartError::Network("timed out".into())));
        assert_eq!(c.view(), ChartView::Error(FETCH_ERROR_MESSAGE.into()));
        assert!(c.series().is_empty());
        assert!(c.render_model().is_empty());
    }

    #[test]
    fn duplicate_completion_is_ignored() {
        let mut c = chart();
        let req = c.request_at("AAPL", Period::OneMonth, now()).unwrap();
        assert!(c.complete(req.token, Ok(bars(5, 1.0))));
        assert!(!c.complete(req.token, Err(ChartError::Network("late".into()))));
        assert!(matches!(c.view(), ChartView::Ready(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Stale responses
// ═══════════════════════════════════════════════════════════════════

mod stale {
    use super::*;

    #[test]
    fn older_response_does_not_overwrite_newer_ticker() {
        let mut c = chart();
        let a = c.request_at("XOM", Period::OneMonth, now()).unwrap();
        let b = c.request_at("YUM", Period::OneMonth, now()).unwrap();
        assert!(b.token > a.token);

        assert!(c.complete(b.token, Ok(bars(10, 50.0))));
        let shown = c.view();

        assert!(!c.complete(a.token, Ok(bars(10, 900.0))));
        assert_eq!(c.view(), shown);
        assert_eq!(c.ticker(), Some("YUM"));
    }

    #[test]
    fn older_response_arriving_first_is_discarded() {
        let mut c = chart();
        let a = c.request_at("XOM", Period::OneMonth, now()).unwrap();
        let b = c.request_at("YUM", Period::OneMonth, now()).unwrap();

        assert!(!c.complete(a.token, Ok(bars(10, 900.0))));
        assert_eq!(c.view(), ChartView::Loading);

        assert!(c.complete(b.token, Ok(bars(10, 50.0))));
        assert_eq!(c.series().first().unwrap().close, 50.0);
    }

    #[test]
    fn older_failure_is_discarded_too() {
        let mut c = chart();
        let a = c.request_at("XOM", Period::OneMonth, now()).unwrap();
        let _b = c.request_at("YUM", Period::OneMonth, now()).unwrap();
        assert!(!c.complete(a.token, Err(ChartError::Network("reset".into()))));
        assert_eq!(c.view(), ChartView::Loading);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Period switches
// ═══════════════════════════════════════════════════════════════════

mod period_switch {
    use super::*;

    #[test]
    fn clears_committed_selection_immediately() {
        let mut c = loaded_chart();
        drag(&mut c, 2, 8);
        assert!(c.selection().is_some());

        let req = c.set_period_at(Period::OneYear, now()).unwrap();
        assert_eq!(c.selection(), None);
        assert_eq!(c.interaction_state(), InteractionState::Idle);
        assert_eq!(req.period, Period::OneYear);
        assert_eq!(req.ticker, "AAPL");
        assert_eq!(c.view(), ChartView::Loading);
    }

    #[test]
    fn clears_drag_in_progress() {
        let mut c = loaded_chart();
        let scale = scale_for(&c);
        c.handle_pointer(PointerEvent::Down { x: 10.0, y: 150.0 }, &scale);
        c.handle_pointer(PointerEvent::Move { x: 50.0, y: 150.0 }, &scale);
        assert!(c.interaction_state().is_dragging());

        c.set_period_at(Period::FiveYears, now());
        assert_eq!(c.interaction_state(), InteractionState::Idle);
        assert_eq!(c.selection_summary(), None);
    }

    #[test]
    fn same_period_is_not_a_change() {
        let mut c = loaded_chart();
        drag(&mut c, 2, 8);
        assert!(c.set_period_at(Period::OneMonth, now()).is_none());
        assert!(c.selection().is_some());
    }

    #[test]
    fn without_ticker_only_the_period_changes() {
        let mut c = chart();
        assert!(c.set_period_at(Period::ThreeMonths, now()).is_none());
        assert_eq!(c.period(), Period::ThreeMonths);
        assert_eq!(c.view(), ChartView::Empty);
    }

    #[test]
    fn period_switch_makes_in_flight_request_stale() {
        let mut c = chart();
        let first = c.request_at("AAPL", Period::OneDay, now()).unwrap();
        let second = c.set_period_at(Period::OneWeek, now()).unwrap();
        assert!(!c.complete(first.token, Ok(bars(10, 1.0))));
        assert!(c.complete(second.token, Ok(bars(10, 1.0))));
        assert_eq!(c.period(), Period::OneWeek);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Pointer gestures & painting
// ═══════════════════════════════════════════════════════════════════

mod gestures {
    use super::*;

    #[test]
    fn pointer_is_inert_while_loading() {
        let mut c = chart();
        c.request_at("AAPL", Period::OneDay, now()).unwrap();
        let anywhere = |_x: f64, _y: f64| -> Option<usize> { Some(0) };
        assert!(!c.handle_pointer(PointerEvent::Down { x: 0.0, y: 0.0 }, &anywhere));
        assert_eq!(c.interaction_state(), InteractionState::Idle);
        assert!(!c.select(SelectionRange::new(0, 1)));
    }

    #[test]
    fn drag_produces_summary_and_overlay() {
        let mut c = loaded_chart();
        let last = c.series().len() - 1;
        drag(&mut c, 0, last);

        let summary = c.selection_summary().unwrap();
        assert_eq!(summary.change.start_price, 100.0);
        assert_eq!(summary.change.end_price, 121.0);
        assert!(summary.change.is_gain());
        assert_eq!(summary.date_range_text(), "Jan 2, 2024 – Jan 23, 2024");

        let scale = scale_for(&c);
        let mut canvas = RecordingCanvas::new();
        let geometry = c.paint(&scale, &mut canvas).unwrap();
        assert_eq!(geometry.color, c.settings().overlay.rise_color);
        assert_eq!(canvas.commands().len(), 6);
    }

    #[test]
    fn click_clears_selection() {
        let mut c = loaded_chart();
        assert!(c.select(SelectionRange::new(3, 1)));
        let scale = scale_for(&c);
        assert!(c.handle_pointer(PointerEvent::Click { x: 500.0, y: 100.0 }, &scale));
        assert_eq!(c.selection(), None);

        let mut canvas = RecordingCanvas::new();
        assert!(c.paint(&scale, &mut canvas).is_none());
        assert!(canvas.is_empty());
    }

    #[test]
    fn hover_exposes_sample_without_overlay() {
        let mut c = loaded_chart();
        let scale = scale_for(&c);
        assert!(c.handle_pointer(PointerEvent::Move { x: 0.0, y: 10.0 }, &scale));
        assert_eq!(c.hovered_sample().unwrap().close, 100.0);

        let mut canvas = RecordingCanvas::new();
        assert!(c.paint(&scale, &mut canvas).is_none());
    }

    #[test]
    fn pointer_outside_plot_is_ignored() {
        let mut c = loaded_chart();
        let scale = scale_for(&c);
        assert!(!c.handle_pointer(PointerEvent::Down { x: -40.0, y: 10.0 }, &scale));
        assert!(!c.handle_pointer(PointerEvent::Down { x: 40.0, y: 900.0 }, &scale));
        assert_eq!(c.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn clear_selection_resets_interaction() {
        let mut c = loaded_chart();
        drag(&mut c, 1, 4);
        c.clear_selection();
        assert_eq!(c.selection(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  End-to-end with a price service
// ═══════════════════════════════════════════════════════════════════

struct DailyProvider;

#[async_trait]
impl PriceProvider for DailyProvider {
    fn name(&self) -> &str {
        "Daily"
    }

    async fn get_prices(
        &self,
        ticker: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        _timespan: Timespan,
        _multiplier: u32,
    ) -> Result<Vec<Sample>, ChartError> {
        match ticker {
            "DOWN" => Err(ChartError::Api {
                provider: "Daily".into(),
                message: "HTTP 500 for DOWN".into(),
            }),
            _ => Ok(bars(250, 10.0)),
        }
    }
}

fn service() -> PriceService {
    let mut registry = PriceProviderRegistry::new();
    registry.register(Box::new(DailyProvider));
    PriceService::new(registry)
}

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn load_downsamples_long_history() {
        let mut c = chart();
        let view = c.load(&service(), "spy", Period::OneYear).await.unwrap();
        let ChartView::Ready(model) = view else {
            panic!("expected ready view");
        };
        // 250 bars, stride 3 → indices 0, 3, ..., 249
        assert_eq!(model.len(), 84);
        assert_eq!(model.values[0], 10.0);
        assert_eq!(*model.values.last().unwrap(), 259.0);
    }

    #[tokio::test]
    async fn load_failure_becomes_error_view() {
        let mut c = chart();
        let view = c.load(&service(), "down", Period::OneMonth).await.unwrap();
        assert_eq!(view, ChartView::Error(FETCH_ERROR_MESSAGE.into()));
    }

    #[test]
    fn provider_detail_stays_out_of_error_view() {
        let mut c = chart();
        let req = c.request_at("AAPL", Period::OneMonth, now()).unwrap();
        c.complete(
            req.token,
            Err(ChartError::Api {
                provider: "Polygon".into(),
                message: "Unknown API Key".into(),
            }),
        );
        match c.view() {
            ChartView::Error(message) => {
                assert_eq!(message, FETCH_ERROR_MESSAGE);
                assert!(!message.contains("API Key"));
            }
            other => panic!("expected error view, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_rejects_invalid_ticker() {
        let mut c = chart();
        assert!(matches!(
            c.load(&service(), "", Period::OneMonth).await,
            Err(ChartError::InvalidTicker(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_fetches_keep_only_latest() {
        let svc = service();
        let mut c = chart();
        let a = c.request_at("XOM", Period::OneMonth, now()).unwrap();
        let b = c.request_at("YUM", Period::OneMonth, now()).unwrap();
        let (ra, rb) = tokio::join!(svc.fetch(&a), svc.fetch(&b));

        assert!(c.complete(b.token, rb));
        assert!(!c.complete(a.token, ra));
        assert_eq!(c.ticker(), Some("YUM"));
    }
}
