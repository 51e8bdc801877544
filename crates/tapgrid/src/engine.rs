//! The grid trading chart engine.
//!
//! [`GridChartEngine`] owns every component of one chart and runs them on the
//! caller's thread. The host feeds it samples, pointer input and viewport
//! sizes, calls [`tick`](GridChartEngine::tick) once per frame, renders
//! [`snapshot`](GridChartEngine::snapshot) and executes the queued
//! [`Command`]s. Only the probability worker runs elsewhere.

use std::time::Instant;

use tapgrid_config::{ChartConfig, Config, OrderConfig};
use tapgrid_core::{
    Axis, GridCell, Kline, Order, OrderGroup, PairConstants, ProbabilityCell, ViewportBounding,
};
use tapgrid_data::{FeedEvent, SubmitError};

use crate::controller::{ChartController, FollowMode};
use crate::coords::{window_width, CoordinateSystem, ScreenPos};
use crate::events::{ChartEvent, Command, EventBus, TapRejection};
use crate::input::{InputAction, InputHandler, PointerEvent};
use crate::orders::{merge_probabilities, OrderBook};
use crate::pan::PanController;
use crate::probability::{PayoutParams, ProbabilityRequest, ProbabilityWorker};
use crate::recenter::RecenterAnimator;
use crate::ripple::{Ripple, RippleBus, RippleSubscription};
use crate::smoother::KlineFeedSmoother;
use crate::snap::{grid_lines, GridSnapResolver};
use crate::snapshot::{FrameSnapshot, GroupMarker, ProbabilityMarker};
use crate::tween::Scheduler;

fn checked_pair(symbol: &str, pair: PairConstants) -> PairConstants {
    if pair.is_valid() {
        pair
    } else {
        log::warn!("invalid grid constants for {symbol}: {pair:?}, using defaults");
        PairConstants::default()
    }
}

/// One interactive chart.
pub struct GridChartEngine {
    chart: ChartConfig,
    order_config: OrderConfig,
    symbol: String,
    pair: PairConstants,
    bounding: ViewportBounding,

    scheduler: Scheduler,
    controller: ChartController,
    smoother: KlineFeedSmoother,
    pan: PanController,
    recenter: RecenterAnimator,
    snap: GridSnapResolver,
    book: OrderBook,
    probabilities: Vec<ProbabilityCell>,
    worker: Option<ProbabilityWorker>,
    ripples: RippleBus,
    input: InputHandler,
    bus: EventBus,
}

impl GridChartEngine {
    /// Build an engine for `symbol`, spawning the probability worker if enabled.
    ///
    /// A worker that fails to start only disables the multiplier overlay.
    pub fn new(config: &Config, symbol: &str) -> Self {
        let pair = checked_pair(symbol, config.pair(symbol));

        let worker = if config.probability.enabled {
            match ProbabilityWorker::spawn(
                PayoutParams::from(&config.probability),
                config.probability.throttle(),
            ) {
                Ok(worker) => Some(worker),
                Err(e) => {
                    log::warn!("probability overlay disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        let chart = config.chart.clone();
        let recenter = &config.recenter;
        log::info!("chart engine ready for {symbol}");

        Self {
            symbol: symbol.to_string(),
            pair,
            bounding: ViewportBounding::default(),
            scheduler: Scheduler::new(),
            controller: ChartController::new(),
            smoother: KlineFeedSmoother::new(chart.feed_interval(), chart.max_points),
            pan: PanController::new(chart.pan_release_grace()),
            recenter: RecenterAnimator::new(
                recenter.duration(),
                recenter.snap_duration(),
                recenter.snap_threshold_cells,
            ),
            snap: GridSnapResolver::new(pair),
            book: OrderBook::new(),
            probabilities: Vec::new(),
            worker,
            ripples: RippleBus::new(chart.ripple_duration()),
            input: InputHandler::new(chart.tap_slop_px),
            bus: EventBus::new(),
            order_config: config.orders.clone(),
            chart,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn pair(&self) -> &PairConstants {
        &self.pair
    }

    pub fn mode(&self) -> FollowMode {
        self.controller.mode()
    }

    pub fn is_moving(&self, now: Instant) -> bool {
        self.controller.is_moving(now)
    }

    pub fn controller(&self) -> &ChartController {
        &self.controller
    }

    pub fn smoother(&self) -> &KlineFeedSmoother {
        &self.smoother
    }

    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    pub fn bounding(&self) -> ViewportBounding {
        self.bounding
    }

    pub fn has_probability_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Queued events and commands for the host.
    pub fn events(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Listen for tap ripples.
    pub fn subscribe_ripples(&self) -> RippleSubscription {
        self.ripples.subscribe()
    }

    /// Pixels per grid cell for the current viewport.
    pub fn grid_size(&self) -> f64 {
        self.bounding.grid_size(self.chart.grid_rows)
    }

    /// Coordinate mapping for the current domains and viewport.
    pub fn coords(&self) -> CoordinateSystem {
        CoordinateSystem::new(
            self.bounding,
            self.controller.x_domain(),
            self.controller.y_domain(),
            self.chart.grid_rows,
        )
    }

    fn window(&self, axis: Axis) -> f64 {
        window_width(self.bounding, self.grid_size(), axis, self.pair.gap(axis))
    }

    // =========================================================================
    // Host inputs
    // =========================================================================

    /// Viewport resize.
    pub fn update_bounding(&mut self, bounding: ViewportBounding) {
        if bounding == self.bounding {
            return;
        }
        log::debug!("viewport {}x{}", bounding.width, bounding.height);
        self.bounding = bounding;

        let time_window = self.window(Axis::Time);
        let price_window = self.window(Axis::Price);
        if self.controller.mode() == FollowMode::Following {
            self.follow_latest();
        } else if self.controller.resize(time_window, price_window) {
            log::debug!("resized {} view around its center", self.controller.mode());
        }
        // Stored pan offsets and flight endpoints belong to the old grid size
        self.pan.rebase(&self.controller);
        self.recenter.resize(time_window, price_window);
        self.bus.dispatch(Command::RequestRedraw);
    }

    /// Handle one event from a [`FeedAdapter`](tapgrid_data::FeedAdapter).
    pub fn on_feed_event(&mut self, event: FeedEvent, now: Instant) {
        match event {
            FeedEvent::Tick(kline) => {
                self.on_kline(kline, now);
            }
            FeedEvent::Connected => {
                log::info!("{} feed connected", self.symbol);
                self.bus.emit(ChartEvent::FeedStatus { connected: true });
            }
            FeedEvent::Disconnected => {
                log::warn!("{} feed disconnected", self.symbol);
                self.bus.emit(ChartEvent::FeedStatus { connected: false });
            }
            FeedEvent::Error(message) => log::warn!("{} feed error: {message}", self.symbol),
        }
    }

    /// Accept a feed sample. Returns false if it was stale or invalid.
    pub fn on_kline(&mut self, kline: Kline, now: Instant) -> bool {
        if !self.smoother.push(kline, &mut self.scheduler, now) {
            return false;
        }
        if self.smoother.len() == 1 {
            self.follow_latest();
        }
        self.bus.dispatch(Command::RequestRedraw);
        true
    }

    /// Advance animations, follow the live point and exchange work with the
    /// probability worker. Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.controller.mode();

        let frames = self.scheduler.tick(now);
        for frame in &frames {
            if !self.smoother.apply(frame) {
                self.recenter.apply(frame, &mut self.controller);
            }
        }
        let mut changed = !frames.is_empty();
        if changed {
            self.follow_latest();
        }
        self.notify_mode(before);

        changed |= self.refresh_probabilities(now);
        if changed {
            self.bus.dispatch(Command::RequestRedraw);
        }
        changed
    }

    /// Route raw pointer input through the tap/pan recognizer.
    pub fn handle_pointer(&mut self, event: PointerEvent, now: Instant) -> Option<InputAction> {
        let action = self.input.handle_pointer(event)?;
        match action {
            InputAction::PanStart { dx, dy } => {
                if self.pan_start() {
                    self.pan_move(dx, dy);
                }
            }
            InputAction::PanMove { dx, dy } => {
                self.pan_move(dx, dy);
            }
            InputAction::PanEnd => {
                self.pan_end(now);
            }
            InputAction::Tap(pos) => {
                // Rejections are reported on the event bus
                let _ = self.tap(pos, now);
            }
            InputAction::CursorMoved(_) => {}
        }
        Some(action)
    }

    // =========================================================================
    // Pan / recenter
    // =========================================================================

    /// Leave follow mode and start dragging. Ignored while recentering.
    pub fn pan_start(&mut self) -> bool {
        let before = self.controller.mode();
        let started = self.pan.start(&mut self.controller);
        self.notify_mode(before);
        started
    }

    /// Drag by a pixel delta.
    pub fn pan_move(&mut self, dx: f64, dy: f64) -> bool {
        let grid_size = self.grid_size();
        let first_time = self.smoother.first_time().map(|t| t as f64);
        let moved = self
            .pan
            .move_by(&mut self.controller, dx, dy, grid_size, &self.pair, first_time);
        if moved {
            self.bus.dispatch(Command::RequestRedraw);
        }
        moved
    }

    /// Release the drag; taps stay suppressed for the release grace.
    pub fn pan_end(&mut self, now: Instant) -> bool {
        self.pan.end(&mut self.controller, now)
    }

    /// Animate back to the live point and resume following.
    ///
    /// Targets the newest kline, not the animated head, so the view lands
    /// where the line is heading.
    pub fn recenter(&mut self, now: Instant) -> bool {
        let Some(point) = self.smoother.last_kline().map(Kline::pos) else {
            return false;
        };
        let time_window = self.window(Axis::Time);
        let price_window = self.window(Axis::Price);

        let before = self.controller.mode();
        self.pan.cancel();
        let started = self.recenter.start(
            &mut self.controller,
            &mut self.scheduler,
            point,
            time_window,
            price_window,
            &self.pair,
            now,
        );
        self.notify_mode(before);
        started
    }

    // =========================================================================
    // Taps and orders
    // =========================================================================

    /// Resolve a tap to a cell and place a pending order there.
    ///
    /// On success a ripple is broadcast, [`ChartEvent::OrderPlaced`] is emitted
    /// and [`Command::SubmitOrder`] is queued for the host.
    pub fn tap(&mut self, pos: ScreenPos, now: Instant) -> Result<GridCell, TapRejection> {
        let result = self.resolve_tap(pos, now);
        match &result {
            Ok(cell) => self.place_order(*cell, pos, now),
            Err(reason) => {
                log::debug!("tap at ({:.1}, {:.1}) rejected: {reason}", pos.x, pos.y);
                self.bus.emit(ChartEvent::TapRejected(reason.clone()));
            }
        }
        result
    }

    fn resolve_tap(&self, pos: ScreenPos, now: Instant) -> Result<GridCell, TapRejection> {
        if self.controller.is_moving(now) {
            return Err(TapRejection::Moving);
        }
        let coords = self.coords();
        let last_time = self.smoother.last_kline().map(|k| k.time);
        if !coords.is_ready() || last_time.is_none() {
            return Err(TapRejection::NotReady);
        }
        if !coords.is_in_chart_area(pos) {
            return Err(TapRejection::Snap(crate::snap::SnapRejection::OutsideGrid));
        }

        let domain_pos = coords.screen_to_domain(pos);
        Ok(self
            .snap
            .resolve_tap(domain_pos, &coords.x_domain, &coords.y_domain, last_time)?)
    }

    fn place_order(&mut self, cell: GridCell, pos: ScreenPos, now: Instant) {
        let key = cell.key();
        let odds = self
            .probabilities
            .iter()
            .find(|p| p.key() == key)
            .map(|p| p.multiplier);

        self.ripples.add_ripple(
            Ripple {
                key,
                x: pos.x,
                y: pos.y,
            },
            now,
        );

        let request = self.book.place(
            cell,
            self.order_config.default_amount,
            &self.order_config.currency,
            &self.order_config.user_id,
            odds,
        );
        log::info!("placing {} {} on {cell}", request.amount, request.currency);
        self.bus.emit(ChartEvent::OrderPlaced {
            temp_id: request.temp_id.clone(),
            cell,
        });
        self.bus.dispatch(Command::SubmitOrder(request));
        self.bus.dispatch(Command::RequestRedraw);
    }

    /// Reconcile a pending order with the gateway's answer.
    ///
    /// Returns false if `temp_id` is unknown, e.g. because the pair changed
    /// while the request was in flight.
    pub fn complete_order(&mut self, temp_id: &str, result: Result<Order, SubmitError>) -> bool {
        match result {
            Ok(order) => {
                let cell = order.cell();
                let order_id = order.id.clone();
                if !self.book.confirm(temp_id, order) {
                    log::debug!("confirmation for unknown order {temp_id}");
                    return false;
                }
                self.bus.emit(ChartEvent::OrderConfirmed {
                    temp_id: temp_id.to_string(),
                    order_id,
                    cell,
                });
            }
            Err(err) => {
                let Some(order) = self.book.reject(temp_id) else {
                    log::debug!("failure for unknown order {temp_id}: {err}");
                    return false;
                };
                log::warn!("order {temp_id} failed: {err}");
                self.bus.emit(ChartEvent::OrderFailed {
                    temp_id: temp_id.to_string(),
                    cell: order.cell(),
                    reason: err.to_string(),
                });
            }
        }
        self.bus.dispatch(Command::RequestRedraw);
        true
    }

    /// Add or update an order from elsewhere, e.g. another user's bet.
    pub fn upsert_order(&mut self, order: Order) {
        self.book.upsert(order);
        self.bus.dispatch(Command::RequestRedraw);
    }

    /// Visible order groups.
    pub fn order_groups(&mut self) -> &[OrderGroup] {
        self.book
            .groups(&self.controller.y_domain(), self.pair.price_gap)
    }

    /// Latest multipliers, minus cells that already hold orders.
    pub fn probability_cells(&mut self) -> Vec<ProbabilityCell> {
        let groups = self
            .book
            .groups(&self.controller.y_domain(), self.pair.price_gap);
        merge_probabilities(&self.probabilities, groups)
    }

    // =========================================================================
    // Pair switch
    // =========================================================================

    /// Switch trading pair, dropping all transient chart state.
    pub fn set_pair(&mut self, symbol: &str, pair: PairConstants) {
        let pair = checked_pair(symbol, pair);
        log::info!("switching chart to {symbol}");

        self.recenter.cancel(&mut self.scheduler);
        self.smoother.clear(&mut self.scheduler);
        self.scheduler.clear();
        self.controller.reset();
        self.pan.cancel();
        self.input.reset();
        self.book.clear();
        self.probabilities.clear();
        if let Some(worker) = self.worker.as_mut() {
            worker.reset();
        }
        self.ripples.clear();
        self.bus.clear();

        self.symbol = symbol.to_string();
        self.pair = pair;
        self.snap = GridSnapResolver::new(pair);

        self.bus.emit(ChartEvent::PairChanged {
            symbol: symbol.to_string(),
        });
        self.bus.dispatch(Command::RequestRedraw);
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Everything needed to draw the current frame.
    pub fn snapshot(&mut self, now: Instant) -> FrameSnapshot {
        let coords = self.coords();
        let pair = self.pair;

        let line = self
            .smoother
            .rendered_points()
            .into_iter()
            .map(|p| coords.domain_to_screen(p))
            .collect();
        let head_point = self.smoother.last_rendered_point();

        let time_lines = grid_lines(&coords.x_domain, pair.time_gap)
            .into_iter()
            .map(|t| coords.to_pixel(Axis::Time, t))
            .collect();
        let price_lines = grid_lines(&coords.y_domain, pair.price_gap)
            .into_iter()
            .map(|p| coords.to_pixel(Axis::Price, p))
            .collect();

        let max_cluster = self.order_config.max_cluster;
        let groups = self.book.groups(&coords.y_domain, pair.price_gap);
        let group_markers = groups
            .iter()
            .filter(|g| coords.x_domain.overlaps(g.cell.time_start, pair.time_gap))
            .filter_map(|g| GroupMarker::new(g, coords.cell_rect(&g.cell, &pair), max_cluster))
            .collect();
        let probabilities = merge_probabilities(&self.probabilities, groups)
            .iter()
            .filter(|c| {
                coords.x_domain.overlaps(c.time, pair.time_gap)
                    && coords.y_domain.overlaps(c.price, pair.price_gap)
            })
            .map(|c| ProbabilityMarker::new(c, coords.cell_rect(&c.cell(), &pair)))
            .collect();

        FrameSnapshot {
            mode: self.controller.mode(),
            moving: self.controller.is_moving(now),
            coords,
            line,
            head: head_point.map(|p| coords.domain_to_screen(p)),
            head_label: head_point.map(|p| pair.format_price(p.price)),
            time_lines,
            price_lines,
            groups: group_markers,
            probabilities,
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn follow_latest(&mut self) -> bool {
        let Some(point) = self.smoother.last_rendered_point() else {
            return false;
        };
        let time_window = self.window(Axis::Time);
        let price_window = self.window(Axis::Price);
        self.controller
            .follow(point, time_window, price_window, self.chart.follow_padding)
    }

    fn notify_mode(&mut self, before: FollowMode) {
        let after = self.controller.mode();
        if after != before {
            log::info!("chart mode {before} -> {after}");
            self.bus.emit(ChartEvent::ModeChanged {
                from: before,
                to: after,
            });
        }
    }

    fn probability_request(&self) -> Option<ProbabilityRequest> {
        let coords = self.coords();
        if !coords.is_ready() {
            return None;
        }
        let last = self.smoother.last_kline()?;
        Some(ProbabilityRequest {
            current_price: last.price,
            current_time: last.time as f64,
            time_ticks: grid_lines(&coords.x_domain, self.pair.time_gap),
            price_ticks: grid_lines(&coords.y_domain, self.pair.price_gap),
            time_gap: self.pair.time_gap,
            price_gap: self.pair.price_gap,
            volatility: self.pair.volatility,
        })
    }

    fn refresh_probabilities(&mut self, now: Instant) -> bool {
        let request = match &self.worker {
            Some(worker) if !worker.is_throttled(now) => self.probability_request(),
            _ => None,
        };
        let Some(worker) = self.worker.as_mut() else {
            return false;
        };

        let posted = match request {
            Some(request) => worker.post(request, now).map(|_| ()),
            None => Ok(()),
        };
        let fresh = worker.poll();

        if let Err(e) = posted {
            log::warn!("probability overlay disabled: {e}");
            self.worker = None;
            self.probabilities.clear();
            return true;
        }
        match fresh {
            Some(cells) => {
                self.probabilities = cells;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn engine() -> GridChartEngine {
        let mut config = Config::default();
        config.probability.enabled = false;
        GridChartEngine::new(&config, "BTCUSDT")
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = engine();
        assert_eq!(engine.mode(), FollowMode::Following);
        assert!(!engine.has_probability_worker());
        assert!(!engine.coords().is_ready());
        assert_eq!(engine.grid_size(), 0.0);
    }

    #[test]
    fn test_update_bounding_requests_redraw_once() {
        let mut engine = engine();
        let bounding = ViewportBounding::new(800.0, 400.0);
        engine.update_bounding(bounding);
        engine.update_bounding(bounding);
        assert_eq!(engine.bounding(), bounding);
        assert_eq!(engine.grid_size(), 40.0);
        assert_eq!(engine.events().take_commands(), vec![Command::RequestRedraw]);
    }

    #[test]
    fn test_first_sample_positions_view() {
        let mut engine = engine();
        engine.update_bounding(ViewportBounding::new(800.0, 400.0));
        assert!(engine.on_kline(Kline::new(50_000, 20.0), Instant::now()));
        assert!(engine.coords().is_ready());
        assert_eq!(engine.controller().x_domain().center(), 50_000.0);
        assert!(engine.controller().y_domain().contains(20.0));
    }

    #[test]
    fn test_recenter_without_data_is_noop() {
        let mut engine = engine();
        assert!(!engine.recenter(Instant::now()));
        assert_eq!(engine.mode(), FollowMode::Following);
    }

    #[test]
    fn test_pan_needs_a_view() {
        let mut engine = engine();
        assert!(!engine.pan_start());
        assert!(!engine.pan_move(10.0, 0.0));
        assert!(!engine.pan_end(Instant::now()));
    }

    #[test]
    fn test_tick_idle_reports_no_change() {
        let mut engine = engine();
        let now = Instant::now();
        assert!(!engine.tick(now));
        assert!(!engine.tick(now + Duration::from_millis(30)));
        assert!(!engine.events().has_commands());
    }

    #[test]
    fn test_lost_worker_disables_overlay() {
        let mut config = Config::default();
        config.probability.throttle_ms = 0;
        let mut engine = GridChartEngine::new(&config, "BTCUSDT");
        assert!(engine.has_probability_worker());

        let now = Instant::now();
        engine.update_bounding(ViewportBounding::new(800.0, 400.0));
        engine.on_kline(Kline::new(50_000, 20.0), now);
        engine.probabilities = vec![ProbabilityCell {
            time: 51_000.0,
            price: 20.0,
            multiplier: 2.0,
        }];
        engine.events().clear();

        engine.worker.as_mut().unwrap().close_jobs();
        assert!(engine.tick(now));
        assert!(!engine.has_probability_worker());
        assert!(engine.probability_cells().is_empty());
        assert!(engine.events().take_commands().contains(&Command::RequestRedraw));

        // The chart keeps running without the overlay
        engine.tick(now + Duration::from_millis(30));
        assert!(!engine.has_probability_worker());
        assert!(engine.probability_cells().is_empty());
        assert_eq!(engine.snapshot(now).line.len(), 1);
    }

    #[test]
    fn test_snapshot_empty_before_data() {
        let mut engine = engine();
        let snapshot = engine.snapshot(Instant::now());
        assert!(snapshot.is_empty());
        assert!(snapshot.head.is_none());
        assert!(snapshot.time_lines.is_empty());
    }
}
