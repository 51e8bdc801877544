//! Touch-probability model behind the payout multipliers.
//!
//! Prices follow a driftless log-normal walk with per-cell volatility
//! `volatility`. Over `n` time cells the spread is `sigma = volatility * sqrt(n)`,
//! and the chance of touching a level at log distance `x` is `2 * N(-x / sigma)`
//! by the reflection principle.

use tapgrid_config::ProbabilityConfig;
use tapgrid_core::{round_to, ProbabilityCell};

pub const MIN_PROBABILITY: f64 = 0.001;
pub const MAX_PROBABILITY: f64 = 0.999;

/// Everything the worker needs to price one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRequest {
    pub current_price: f64,
    pub current_time: f64,
    /// Lower edges of the visible time cells.
    pub time_ticks: Vec<f64>,
    /// Lower edges of the visible price cells.
    pub price_ticks: Vec<f64>,
    pub time_gap: f64,
    pub price_gap: f64,
    pub volatility: f64,
}

/// House parameters applied on top of the raw probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutParams {
    pub house_edge: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
}

impl Default for PayoutParams {
    fn default() -> Self {
        Self::from(&ProbabilityConfig::default())
    }
}

impl From<&ProbabilityConfig> for PayoutParams {
    fn from(config: &ProbabilityConfig) -> Self {
        Self {
            house_edge: config.house_edge,
            min_multiplier: config.min_multiplier,
            max_multiplier: config.max_multiplier,
        }
    }
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17. Accurate to about 1.5e-7.
pub fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let b1 = 0.319381530;
    let b2 = -0.356563782;
    let b3 = 1.781477937;
    let b4 = -1.821255978;
    let b5 = 1.330274429;
    let p = 0.2316419;

    let t = 1.0 / (1.0 + p * x);
    let poly = t * (b1 + t * (b2 + t * (b3 + t * (b4 + t * b5))));
    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let cdf = 1.0 - pdf * poly;

    0.5 * (1.0 + sign * (2.0 * cdf - 1.0))
}

/// Probability that the price touches the band `[low, high)` within a spread of `sigma`.
pub fn touch_probability(current: f64, low: f64, high: f64, sigma: f64) -> f64 {
    if current >= low && current < high {
        return MAX_PROBABILITY;
    }
    if !(current > 0.0 && low > 0.0) || !(sigma > 1e-12) {
        return MIN_PROBABILITY;
    }

    let edge = if current < low { low } else { high };
    let d = (edge / current).ln().abs() / sigma;
    (2.0 * normal_cdf(-d)).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// Fair odds minus the house edge, clamped and rounded to cents.
pub fn multiplier(probability: f64, params: &PayoutParams) -> f64 {
    let p = probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY);
    let raw = (1.0 - params.house_edge) / p;
    round_to(raw.clamp(params.min_multiplier, params.max_multiplier), 2)
}

/// Multiplier for every future cell of the request. Cells that have already started are skipped.
pub fn compute_cells(request: &ProbabilityRequest, params: &PayoutParams) -> Vec<ProbabilityCell> {
    if !(request.time_gap > 0.0 && request.price_gap > 0.0) {
        return Vec::new();
    }

    let mut cells = Vec::with_capacity(request.time_ticks.len() * request.price_ticks.len());
    for &time in &request.time_ticks {
        let ticks_ahead = (time - request.current_time) / request.time_gap;
        if ticks_ahead <= 0.0 {
            continue;
        }
        let sigma = request.volatility * ticks_ahead.sqrt();
        for &price in &request.price_ticks {
            let upper = price + request.price_gap;
            let p = touch_probability(request.current_price, price, upper, sigma);
            cells.push(ProbabilityCell {
                time,
                price,
                multiplier: multiplier(p, params),
            });
        }
    }
    cells
}
