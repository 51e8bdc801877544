//! End-to-end scenarios driving `GridChartEngine` the way a host would.
//!
//! Viewport is 1000x600 with 10 rows, so one grid cell is 60px, the time
//! window is 16_666.67ms and the price window is 5.0 at the default pair.

use std::time::{Duration, Instant};

use tapgrid::{
    ChartEvent, Command, FollowMode, GridChartEngine, InputAction, PointerEvent, ScreenPos,
    SnapRejection, TapRejection,
};
use tapgrid_config::Config;
use tapgrid_core::{Axis, GridCell, Kline, Order, OrderStatus, PairConstants, ViewportBounding};
use tapgrid_data::{FeedEvent, OrderGateway, PaperGateway, SubmitError};

const LAST_TIME: i64 = 1_000_000;
const PRICE: f64 = 100.2;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.probability.enabled = false;
    config
}

/// Engine with 20s of flat history ending at `LAST_TIME`, all tweens settled.
fn settled_engine(config: &Config) -> (GridChartEngine, Instant) {
    let start = Instant::now();
    let mut engine = GridChartEngine::new(config, "BTCUSDT");
    engine.update_bounding(ViewportBounding::new(1000.0, 600.0));
    for t in (980_000..=LAST_TIME).step_by(500) {
        assert!(engine.on_kline(Kline::new(t, PRICE), start));
    }
    let now = start + ms(1_000);
    engine.tick(now);
    engine.events().clear();
    (engine, now)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Screen position of (1_003_500ms, 100.2), inside cell (1_003_000, 100.0).
fn future_tap() -> ScreenPos {
    ScreenPos::new(710.0, 300.0)
}

fn order(id: &str, user: &str) -> Order {
    Order {
        id: id.to_string(),
        user_id: user.to_string(),
        time_cell_start: 1_003_000.0,
        price_cell_start: 100.0,
        amount: 10.0,
        currency: "USDT".to_string(),
        odds: None,
        status: OrderStatus::Confirmed,
    }
}

#[test]
fn test_follow_centers_on_live_point() {
    let (engine, _) = settled_engine(&quiet_config());
    let x = engine.controller().x_domain();
    let y = engine.controller().y_domain();
    assert!(approx(x.center(), LAST_TIME as f64));
    assert!((x.width() - 16_666.666_666).abs() < 1e-3);
    assert!(approx(y.width(), 5.0));
    assert!(y.contains(PRICE));
    assert_eq!(engine.mode(), FollowMode::Following);
}

#[test]
fn test_stale_sample_is_dropped() {
    let (mut engine, now) = settled_engine(&quiet_config());
    assert!(!engine.on_kline(Kline::new(LAST_TIME, 101.0), now));
    assert!(!engine.on_kline(Kline::new(LAST_TIME - 1, 101.0), now));
    assert_eq!(engine.smoother().last_kline().map(|k| k.time), Some(LAST_TIME));
}

#[test]
fn test_smoothing_interpolates_between_samples() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.on_kline(Kline::new(LAST_TIME + 500, 101.2), now);
    engine.tick(now + ms(250));
    let head = engine.smoother().last_rendered_point().unwrap();
    assert!(head.time > LAST_TIME as f64 && head.time < (LAST_TIME + 500) as f64);
    assert!(head.price > PRICE && head.price < 101.2);

    engine.tick(now + ms(600));
    let head = engine.smoother().last_rendered_point().unwrap();
    assert!(approx(head.time, (LAST_TIME + 500) as f64));
    assert!(approx(head.price, 101.2));
}

#[test]
fn test_tap_snaps_to_future_cell() {
    let (mut engine, now) = settled_engine(&quiet_config());
    let ripples = engine.subscribe_ripples();

    let cell = engine.tap(future_tap(), now).unwrap();
    assert_eq!(cell.time_start, 1_003_000.0);
    assert_eq!(cell.price_start, 100.0);

    let events = engine.events().take_events();
    assert!(matches!(&events[..], [ChartEvent::OrderPlaced { cell: c, .. }] if *c == cell));
    let commands = engine.events().take_commands();
    assert!(matches!(&commands[0], Command::SubmitOrder(r) if r.cell() == cell));
    assert!(commands.contains(&Command::RequestRedraw));

    assert_eq!(engine.order_book().pending_count(), 1);
    let frame = ripples.frame(now + ms(100)).unwrap();
    assert_eq!(frame.key, cell.key());
    assert!(frame.scale > 0.0 && frame.opacity < 1.0);
}

#[test]
fn test_tap_on_elapsed_cell_rejected() {
    let (mut engine, now) = settled_engine(&quiet_config());
    let result = engine.tap(ScreenPos::new(100.0, 300.0), now);
    assert!(matches!(
        result,
        Err(TapRejection::Snap(SnapRejection::Elapsed { .. }))
    ));
    assert!(engine.order_book().is_empty());
    assert!(matches!(
        &engine.events().take_events()[..],
        [ChartEvent::TapRejected(_)]
    ));
}

#[test]
fn test_tap_outside_chart_rejected() {
    let (mut engine, now) = settled_engine(&quiet_config());
    assert_eq!(
        engine.tap(ScreenPos::new(1200.0, 300.0), now),
        Err(TapRejection::Snap(SnapRejection::OutsideGrid))
    );
}

#[test]
fn test_tap_before_first_sample_not_ready() {
    let mut engine = GridChartEngine::new(&quiet_config(), "BTCUSDT");
    engine.update_bounding(ViewportBounding::new(1000.0, 600.0));
    assert_eq!(
        engine.tap(future_tap(), Instant::now()),
        Err(TapRejection::NotReady)
    );
}

#[test]
fn test_drag_two_cells_moves_two_time_gaps() {
    let (mut engine, _) = settled_engine(&quiet_config());
    let before = engine.controller().x_domain();
    let before_y = engine.controller().y_domain();

    assert!(engine.pan_start());
    assert_eq!(engine.mode(), FollowMode::Panning);
    assert!(engine.pan_move(120.0, 0.0));

    let after = engine.controller().x_domain();
    assert!(approx(before.min - after.min, 2_000.0));
    assert!(approx(before.max - after.max, 2_000.0));
    assert_eq!(engine.controller().y_domain(), before_y);

    // dragging down reveals higher prices
    engine.pan_move(0.0, 60.0);
    assert!(approx(engine.controller().y_domain().min - before_y.min, 0.5));
}

#[test]
fn test_pan_clamped_at_first_sample() {
    let (mut engine, _) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_move(10_000.0, 0.0);
    assert!(approx(engine.controller().x_domain().min, 980_000.0));

    // reversing responds immediately instead of unwinding the overshoot
    engine.pan_move(-60.0, 0.0);
    assert!(approx(engine.controller().x_domain().min, 981_000.0));
}

#[test]
fn test_tap_suppressed_while_panning_and_during_grace() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.pan_start();
    assert_eq!(engine.tap(future_tap(), now), Err(TapRejection::Moving));

    engine.pan_end(now);
    assert_eq!(engine.tap(future_tap(), now + ms(50)), Err(TapRejection::Moving));
    assert!(engine.tap(future_tap(), now + ms(200)).is_ok());
    // still manual until recentered
    assert_eq!(engine.mode(), FollowMode::Panning);
}

#[test]
fn test_follow_paused_while_panning() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_end(now);
    let parked = engine.controller().x_domain();

    engine.on_kline(Kline::new(LAST_TIME + 500, PRICE), now);
    engine.tick(now + ms(600));
    assert_eq!(engine.controller().x_domain(), parked);
}

#[test]
fn test_recenter_converges_and_resumes_following() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_move(300.0, 120.0);
    engine.pan_end(now);
    engine.events().clear();

    assert!(engine.recenter(now));
    assert_eq!(engine.mode(), FollowMode::Recentering);
    assert!(!engine.pan_start());

    engine.tick(now + ms(250));
    assert_eq!(engine.mode(), FollowMode::Recentering);
    assert!(engine.is_moving(now + ms(250)));
    let mid = engine.controller().x_domain().center();
    assert!(mid > (LAST_TIME - 5_000) as f64 && mid < LAST_TIME as f64);

    engine.tick(now + ms(600));
    assert_eq!(engine.mode(), FollowMode::Following);
    assert!(!engine.is_moving(now + ms(600)));
    assert!(approx(engine.controller().x_domain().center(), LAST_TIME as f64));
    assert!(approx(engine.controller().y_domain().center(), PRICE));

    let modes: Vec<(FollowMode, FollowMode)> = engine
        .events()
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            ChartEvent::ModeChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        vec![
            (FollowMode::Panning, FollowMode::Recentering),
            (FollowMode::Recentering, FollowMode::Following),
        ]
    );
}

#[test]
fn test_recenter_aims_at_newest_sample() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_move(300.0, 0.0);
    engine.pan_end(now);
    let from = engine.controller().x_domain().center();

    // the head is still at LAST_TIME when the recenter starts
    engine.on_kline(Kline::new(LAST_TIME + 500, PRICE), now);
    assert!(engine.recenter(now));

    engine.tick(now + ms(250));
    let target = (LAST_TIME + 500) as f64;
    let mid = engine.controller().x_domain().center();
    assert!(approx(mid, from + (target - from) * 0.5));
}

#[test]
fn test_resize_while_panned_keeps_cells_square() {
    let (mut engine, _) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_move(60.0, 0.0);
    let time_center = engine.controller().x_domain().center();
    let price_center = engine.controller().y_domain().center();

    engine.update_bounding(ViewportBounding::new(1000.0, 300.0));
    let grid = engine.grid_size();
    assert_eq!(grid, 30.0);
    assert_eq!(engine.mode(), FollowMode::Panning);
    assert!(approx(engine.controller().x_domain().center(), time_center));
    assert!(approx(engine.controller().y_domain().center(), price_center));

    let pair = *engine.pair();
    let rect = engine
        .coords()
        .cell_rect(&GridCell::new(1_003_000.0, 100.0), &pair);
    assert!(approx(rect.width, grid));
    assert!(approx(rect.height, grid));

    // a two-cell drag still moves the content by exactly two cells
    let before = engine.coords().to_pixel(Axis::Time, LAST_TIME as f64);
    assert!(engine.pan_move(2.0 * grid, 0.0));
    let after = engine.coords().to_pixel(Axis::Time, LAST_TIME as f64);
    assert!(approx(after - before, 2.0 * grid));
}

#[test]
fn test_resize_during_recenter_lands_on_new_window() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.pan_start();
    engine.pan_move(300.0, 120.0);
    engine.pan_end(now);
    assert!(engine.recenter(now));
    engine.tick(now + ms(250));

    engine.update_bounding(ViewportBounding::new(1000.0, 300.0));
    assert_eq!(engine.mode(), FollowMode::Recentering);
    let pair = *engine.pair();
    let cell = GridCell::new(1_003_000.0, 100.0);
    let rect = engine.coords().cell_rect(&cell, &pair);
    assert!(approx(rect.width, rect.height));

    engine.tick(now + ms(600));
    assert_eq!(engine.mode(), FollowMode::Following);
    let x = engine.controller().x_domain();
    assert!(approx(x.center(), LAST_TIME as f64));
    assert!(approx(x.width(), 1000.0 / 30.0 * 1_000.0));
    let rect = engine.coords().cell_rect(&cell, &pair);
    assert!(approx(rect.width, 30.0));
    assert!(approx(rect.height, 30.0));
}

#[test]
fn test_pointer_press_release_places_order() {
    let (mut engine, now) = settled_engine(&quiet_config());
    assert_eq!(engine.handle_pointer(PointerEvent::Pressed(future_tap()), now), None);
    assert_eq!(
        engine.handle_pointer(PointerEvent::Released(future_tap()), now),
        Some(InputAction::Tap(future_tap()))
    );
    assert_eq!(engine.order_book().len(), 1);
}

#[test]
fn test_pointer_drag_pans() {
    let (mut engine, now) = settled_engine(&quiet_config());
    let before = engine.controller().x_domain();
    engine.handle_pointer(PointerEvent::Pressed(ScreenPos::new(500.0, 300.0)), now);
    engine.handle_pointer(PointerEvent::Moved(ScreenPos::new(560.0, 300.0)), now);
    engine.handle_pointer(PointerEvent::Moved(ScreenPos::new(620.0, 300.0)), now);
    engine.handle_pointer(PointerEvent::Released(ScreenPos::new(620.0, 300.0)), now);

    assert_eq!(engine.mode(), FollowMode::Panning);
    assert!(approx(before.min - engine.controller().x_domain().min, 2_000.0));
    assert!(engine.order_book().is_empty());
}

#[test]
fn test_order_confirmed_through_gateway() {
    let config = quiet_config();
    let (mut engine, now) = settled_engine(&config);
    let gateway = PaperGateway::new(config.orders.user_id.clone());
    let cell = engine.tap(future_tap(), now).unwrap();

    for command in engine.events().take_commands() {
        if let Command::SubmitOrder(request) = command {
            let result = gateway.submit(&request);
            assert!(engine.complete_order(&request.temp_id, result));
        }
    }

    let book = engine.order_book();
    assert_eq!(book.len(), 1);
    assert_eq!(book.pending_count(), 0);
    assert_eq!(book.orders()[0].status, OrderStatus::Confirmed);
    assert_eq!(book.orders()[0].cell(), cell);
    assert!(engine
        .events()
        .take_events()
        .iter()
        .any(|e| matches!(e, ChartEvent::OrderConfirmed { cell: c, .. } if *c == cell)));
}

#[test]
fn test_order_failure_rolls_back() {
    let config = quiet_config();
    let (mut engine, now) = settled_engine(&config);
    let gateway = PaperGateway::new(config.orders.user_id.clone()).with_max_amount(1.0);
    engine.tap(future_tap(), now).unwrap();

    let request = engine
        .events()
        .take_commands()
        .into_iter()
        .find_map(|c| match c {
            Command::SubmitOrder(r) => Some(r),
            _ => None,
        })
        .unwrap();
    let result = gateway.submit(&request);
    assert!(matches!(result, Err(SubmitError::Rejected(_))));
    assert!(engine.complete_order(&request.temp_id, result));

    assert!(engine.order_book().is_empty());
    let events = engine.events().take_events();
    assert!(matches!(
        events.last(),
        Some(ChartEvent::OrderFailed { temp_id, .. }) if *temp_id == request.temp_id
    ));

    // a late duplicate answer is ignored
    assert!(!engine.complete_order(&request.temp_id, Err(SubmitError::Timeout)));
}

#[test]
fn test_five_users_render_as_one_cluster() {
    let (mut engine, now) = settled_engine(&quiet_config());
    for i in 0..5 {
        engine.upsert_order(order(&format!("o{i}"), &format!("user{i}")));
    }
    // same identity again does not add a marker
    engine.upsert_order(order("o0", "user0"));

    assert_eq!(engine.order_groups().len(), 1);
    assert_eq!(engine.order_groups()[0].len(), 5);

    let snapshot = engine.snapshot(now);
    assert_eq!(snapshot.groups.len(), 1);
    let marker = &snapshot.groups[0];
    assert!(marker.clustered);
    assert_eq!(marker.count(), 5);
    assert_eq!(marker.key, "1003000-100");
    assert!(approx(marker.rect.width, 60.0));
    assert!(approx(marker.rect.height, 60.0));
}

#[test]
fn test_snapshot_projects_line_and_grid() {
    let (mut engine, now) = settled_engine(&quiet_config());
    let snapshot = engine.snapshot(now);
    assert!(!snapshot.is_empty());
    assert_eq!(snapshot.mode, FollowMode::Following);
    assert_eq!(snapshot.line.len(), 41);

    let head = snapshot.head.unwrap();
    assert!(approx(head.x, 500.0));
    assert_eq!(snapshot.head_label.as_deref(), Some("100.20"));

    // 16.67 cells wide starting mid-cell, 5 price cells tall starting mid-cell
    assert_eq!(snapshot.time_lines.len(), 18);
    assert_eq!(snapshot.price_lines.len(), 11);
    assert!(snapshot.time_lines.windows(2).all(|w| approx(w[1] - w[0], 60.0)));
}

#[test]
fn test_pixel_round_trip() {
    let (engine, _) = settled_engine(&quiet_config());
    let coords = engine.coords();
    for (x, y) in [(0.0, 0.0), (123.4, 567.8), (999.0, 1.0), (500.0, 300.0)] {
        let pos = ScreenPos::new(x, y);
        let back = coords.domain_to_screen(coords.screen_to_domain(pos));
        assert!((back.x - x).abs() < 1e-6 && (back.y - y).abs() < 1e-6);
    }
}

#[test]
fn test_set_pair_resets_chart() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.tap(future_tap(), now).unwrap();
    let stale = engine
        .events()
        .take_commands()
        .into_iter()
        .find_map(|c| match c {
            Command::SubmitOrder(r) => Some(r.temp_id),
            _ => None,
        })
        .unwrap();
    engine.pan_start();

    let eth = PairConstants::new(1_000.0, 1.0, 0.003, 2);
    engine.set_pair("ETHUSDT", eth);

    assert_eq!(engine.symbol(), "ETHUSDT");
    assert_eq!(*engine.pair(), eth);
    assert_eq!(engine.mode(), FollowMode::Following);
    assert!(engine.smoother().is_empty());
    assert!(engine.order_book().is_empty());
    assert!(!engine.is_moving(now));
    assert_eq!(
        engine.events().take_events(),
        vec![ChartEvent::PairChanged {
            symbol: "ETHUSDT".to_string()
        }]
    );
    assert!(!engine.complete_order(&stale, Err(SubmitError::Timeout)));
}

#[test]
fn test_invalid_pair_falls_back_to_defaults() {
    let (mut engine, _) = settled_engine(&quiet_config());
    engine.set_pair("BAD", PairConstants::new(0.0, -1.0, 0.001, 2));
    assert_eq!(*engine.pair(), PairConstants::default());
}

#[test]
fn test_feed_status_events() {
    let (mut engine, now) = settled_engine(&quiet_config());
    engine.on_feed_event(FeedEvent::Disconnected, now);
    engine.on_feed_event(FeedEvent::Error("socket reset".to_string()), now);
    engine.on_feed_event(FeedEvent::Connected, now);
    assert_eq!(
        engine.events().take_events(),
        vec![
            ChartEvent::FeedStatus { connected: false },
            ChartEvent::FeedStatus { connected: true },
        ]
    );

    engine.on_feed_event(FeedEvent::Tick(Kline::new(LAST_TIME + 500, 100.4)), now);
    assert_eq!(engine.smoother().last_kline().map(|k| k.time), Some(LAST_TIME + 500));
}

#[test]
fn test_probability_overlay_arrives_from_worker() {
    let mut config = Config::default();
    config.probability.throttle_ms = 0;
    let (mut engine, _) = settled_engine(&config);
    assert!(engine.has_probability_worker());

    let mut cells = Vec::new();
    for _ in 0..200 {
        engine.tick(Instant::now());
        cells = engine.probability_cells();
        if !cells.is_empty() {
            break;
        }
        std::thread::sleep(ms(10));
    }
    assert!(!cells.is_empty());
    assert!(cells
        .iter()
        .all(|c| c.multiplier >= 1.01 && c.multiplier <= 100.0));
    assert!(cells.iter().all(|c| c.time > LAST_TIME as f64));

    // occupied cells lose their multiplier
    let target = cells[0];
    let mut taken = order("srv", "someone");
    taken.time_cell_start = target.time;
    taken.price_cell_start = target.price;
    engine.upsert_order(taken);
    assert!(!engine
        .probability_cells()
        .iter()
        .any(|c| c.key() == target.key()));
}
