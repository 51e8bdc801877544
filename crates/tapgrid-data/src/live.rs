//! Simulated live feed producing a random-walk price stream.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tapgrid_core::Kline;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::source::{FeedAdapter, FeedEvent};
use crate::validation::SequenceGuard;

/// Geometric random walk with uniform shocks of unit variance.
#[derive(Debug)]
pub struct RandomWalk {
    price: f64,
    volatility: f64,
    last_time: i64,
    rng: StdRng,
}

impl RandomWalk {
    pub fn new(start_price: f64, volatility: f64) -> Self {
        Self::with_rng(start_price, volatility, StdRng::from_entropy())
    }

    /// Deterministic walk for tests.
    pub fn seeded(start_price: f64, volatility: f64, seed: u64) -> Self {
        Self::with_rng(start_price, volatility, StdRng::seed_from_u64(seed))
    }

    fn with_rng(start_price: f64, volatility: f64, rng: StdRng) -> Self {
        Self {
            price: start_price,
            volatility,
            last_time: i64::MIN,
            rng,
        }
    }

    /// Produce the sample for wall-clock time `now_ms`.
    ///
    /// Times are forced strictly increasing even if the clock stalls.
    pub fn step(&mut self, now_ms: i64) -> Kline {
        let shock: f64 = self.rng.gen_range(-1.0..1.0) * 3f64.sqrt();
        self.price *= (self.volatility * shock).exp();
        let time = if now_ms > self.last_time {
            now_ms
        } else {
            self.last_time + 1
        };
        self.last_time = time;
        Kline::new(time, self.price)
    }
}

/// Feed adapter emitting a random walk at a fixed cadence.
pub struct SimulatedFeed {
    runtime: Handle,
    interval: Duration,
    start_price: f64,
    volatility: f64,
    symbol: String,
    task: Option<JoinHandle<()>>,
}

impl SimulatedFeed {
    /// Create a new simulated feed running on `runtime`.
    pub fn new(runtime: Handle, interval: Duration) -> Self {
        Self {
            runtime,
            interval,
            start_price: 100.0,
            volatility: 0.0005,
            symbol: String::new(),
            task: None,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Check if a stream task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl FeedAdapter for SimulatedFeed {
    fn subscribe(&mut self, symbol: &str) -> anyhow::Result<mpsc::Receiver<FeedEvent>> {
        if self.interval.is_zero() {
            anyhow::bail!("feed interval must be non-zero");
        }
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            anyhow::bail!("invalid start price {}", self.start_price);
        }

        // Close existing stream if any
        self.unsubscribe();

        self.symbol = symbol.to_uppercase();
        let (event_tx, event_rx) = mpsc::channel(100);
        let walk = RandomWalk::new(self.start_price, self.volatility);
        let interval = self.interval;
        let symbol = self.symbol.clone();

        log::info!("simulated feed for {} started ({:?} cadence)", symbol, interval);
        self.task = Some(self.runtime.spawn(async move {
            run_walk(walk, interval, event_tx, symbol).await;
        }));

        Ok(event_rx)
    }

    fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            log::info!("simulated feed for {} stopped", self.symbol);
        }
        self.symbol.clear();
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Drop for SimulatedFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Forward walk samples until the receiver goes away.
async fn run_walk(
    mut walk: RandomWalk,
    interval: Duration,
    event_tx: mpsc::Sender<FeedEvent>,
    symbol: String,
) {
    if event_tx.send(FeedEvent::Connected).await.is_err() {
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    let mut guard = SequenceGuard::new();

    loop {
        ticker.tick().await;
        let sample = walk.step(now_ms());
        if !guard.accept(&sample) {
            log::debug!("{}: dropped sample {:?}", symbol, sample);
            continue;
        }
        if event_tx.send(FeedEvent::Tick(sample)).await.is_err() {
            break;
        }
    }

    log::debug!("{}: feed receiver closed", symbol);
}
