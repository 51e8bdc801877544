//! Discrete grid cells and per-pair grid constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Axis, DomainPos};

/// Decimal places kept in cell coordinates, so float noise never leaks into keys.
pub const KEY_PRECISION: u32 = 9;

/// Largest scale exponent used for integer-scaled arithmetic.
const MAX_SCALE_DIGITS: u32 = 12;

/// Values beyond this magnitude have no fractional precision left at f64.
const EXACT_LIMIT: f64 = 9.0e15;

/// Number of digits after the decimal point in the shortest representation of `value`.
///
/// `decimal_digits(0.01) == 2`, `decimal_digits(1000.0) == 0`.
pub fn decimal_digits(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let text = format!("{}", value.abs());
    match text.split_once('.') {
        Some((_, frac)) => (frac.len() as u32).min(MAX_SCALE_DIGITS),
        None => 0,
    }
}

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_LIMIT {
        return value;
    }
    scaled.round() / factor
}

/// Grid constants for one trading pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConstants {
    /// Cell width on the time axis, in milliseconds.
    pub time_gap: f64,
    /// Cell height on the price axis, in price units.
    pub price_gap: f64,
    /// Per-time-cell volatility of log returns used by the probability model.
    pub volatility: f64,
    /// Display precision for prices.
    pub decimal_places: u32,
}

impl Default for PairConstants {
    fn default() -> Self {
        Self {
            time_gap: 1_000.0,
            price_gap: 0.5,
            volatility: 0.002,
            decimal_places: 2,
        }
    }
}

impl PairConstants {
    pub fn new(time_gap: f64, price_gap: f64, volatility: f64, decimal_places: u32) -> Self {
        Self {
            time_gap,
            price_gap,
            volatility,
            decimal_places,
        }
    }

    /// Cell size along an axis.
    pub fn gap(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Time => self.time_gap,
            Axis::Price => self.price_gap,
        }
    }

    /// Both gaps must be positive and finite for any grid math to work.
    pub fn is_valid(&self) -> bool {
        self.time_gap.is_finite()
            && self.time_gap > 0.0
            && self.price_gap.is_finite()
            && self.price_gap > 0.0
            && self.volatility.is_finite()
            && self.volatility >= 0.0
    }

    /// Format a price with the pair's display precision.
    pub fn format_price(&self, price: f64) -> String {
        format!("{:.*}", self.decimal_places as usize, price)
    }
}

/// A discrete grid cell, identified by the lower edge on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridCell {
    pub time_start: f64,
    pub price_start: f64,
}

impl GridCell {
    /// Build a cell, rounding both coordinates to [`KEY_PRECISION`].
    pub fn new(time_start: f64, price_start: f64) -> Self {
        Self {
            time_start: round_to(time_start, KEY_PRECISION),
            price_start: round_to(price_start, KEY_PRECISION),
        }
    }

    /// Stable grouping key, `"{time_start}-{price_start}"`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Lower-inclusive, upper-exclusive containment on both axes.
    pub fn contains(&self, pos: DomainPos, pair: &PairConstants) -> bool {
        pos.time >= self.time_start
            && pos.time < self.time_start + pair.time_gap
            && pos.price >= self.price_start
            && pos.price < self.price_start + pair.price_gap
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.time_start, self.price_start)
    }
}
