//! Tapgrid - headless demo driver.
//!
//! Streams a simulated feed into a [`GridChartEngine`], ticks it at the
//! configured frame rate, taps cells ahead of the price at a fixed cadence
//! and routes the resulting orders through a paper gateway.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tapgrid::{ChartEvent, Command, GridChartEngine, ScreenPos};
use tapgrid_config::Config;
use tapgrid_core::ViewportBounding;
use tapgrid_data::{FeedAdapter, OrderGateway, PaperGateway, SimulatedFeed};

#[derive(Parser, Debug)]
#[command(name = "tapgrid", about = "Run the grid chart engine against a simulated feed")]
struct Args {
    /// Trading pair to chart
    #[arg(short, long)]
    symbol: Option<String>,

    /// How long to run, in seconds
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Config file (defaults to ./tapgrid.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Seconds between automatic taps; 0 disables them
    #[arg(long, default_value_t = 2)]
    tap_every: u64,

    /// Starting price of the simulated walk
    #[arg(long, default_value_t = 100.0)]
    start_price: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load_default(),
    };
    let symbol = args
        .symbol
        .clone()
        .unwrap_or_else(|| config.general.default_symbol.clone());

    let mut engine = GridChartEngine::new(&config, &symbol);
    engine.update_bounding(ViewportBounding {
        width: args.width,
        height: args.height,
    });
    let ripples = engine.subscribe_ripples();

    let pair = engine.pair();
    let handle = tokio::runtime::Handle::current();
    let mut feed = SimulatedFeed::new(handle, config.chart.feed_interval())
        .with_start_price(args.start_price)
        .with_volatility(pair.volatility);
    let mut feed_rx = feed.subscribe(&symbol)?;

    let gateway = PaperGateway::new(config.orders.user_id.clone());
    let mut frames = tokio::time::interval(config.chart.frame_interval());
    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.seconds);
    let tap_every = Duration::from_secs(args.tap_every);
    let mut last_tap = started;
    let mut frame_count: u64 = 0;

    log::info!("running {symbol} for {}s", args.seconds);

    loop {
        tokio::select! {
            event = feed_rx.recv() => match event {
                Some(event) => engine.on_feed_event(event, Instant::now()),
                None => {
                    log::warn!("feed closed");
                    break;
                }
            },
            _ = frames.tick() => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                frame_count += 1;
                engine.tick(now);

                if !tap_every.is_zero() && now.duration_since(last_tap) >= tap_every {
                    last_tap = now;
                    // Three quarters across is always ahead of the live point
                    let pos = ScreenPos::new(args.width * 0.75, args.height * 0.5);
                    let _ = engine.tap(pos, now);
                }

                for command in engine.events().take_commands() {
                    match command {
                        Command::SubmitOrder(request) => {
                            let result = gateway.submit(&request);
                            engine.complete_order(&request.temp_id, result);
                        }
                        Command::RequestRedraw => {
                            let snapshot = engine.snapshot(now);
                            log::trace!(
                                "frame {frame_count}: {} points, {} groups, {} multipliers",
                                snapshot.line.len(),
                                snapshot.groups.len(),
                                snapshot.probabilities.len()
                            );
                        }
                    }
                }

                if let Some(frame) = ripples.frame(now) {
                    log::trace!("ripple {} at scale {:.2}", frame.key, frame.scale);
                }

                for event in engine.events().take_events() {
                    match event {
                        ChartEvent::OrderConfirmed { order_id, cell, .. } => {
                            log::info!("order {order_id} confirmed on {cell}");
                        }
                        ChartEvent::OrderFailed { cell, reason, .. } => {
                            log::warn!("order on {cell} failed: {reason}");
                        }
                        ChartEvent::TapRejected(reason) => log::info!("tap rejected: {reason}"),
                        other => log::debug!("{other:?}"),
                    }
                }
            }
        }
    }

    feed.unsubscribe();
    log::info!(
        "done: {frame_count} frames, {} orders, mode {}",
        engine.order_book().len(),
        engine.mode()
    );
    Ok(())
}
