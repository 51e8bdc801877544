//! Maps a continuous domain point onto a discrete grid cell.
//!
//! Cell boundaries are anchored to multiples of the gap, independent of where
//! the domain happens to start. Arithmetic runs on values scaled by
//! `10^decimal_digits(gap)` so fractional gaps such as `0.1` align exactly.

use tapgrid_core::{
    decimal_digits, round_to, Domain, DomainPos, GridCell, PairConstants, KEY_PRECISION,
};
use thiserror::Error;

/// Upper bound on how many cells past the domain origin a point may lie.
pub const MAX_SCAN_CELLS: u32 = 10_000;

/// Why a tap did not produce an order cell.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapRejection {
    #[error("point is outside the resolvable grid")]
    OutsideGrid,
    #[error("cell starting at {cell_time} has already begun (last sample at {last_time})")]
    Elapsed { cell_time: f64, last_time: i64 },
}

fn scale_factor(gap: f64) -> f64 {
    10f64.powi(decimal_digits(gap) as i32)
}

/// Scaled `(origin, gap)` for a domain starting at `domain_start`.
fn scaled_origin(domain_start: f64, gap: f64) -> Option<(f64, f64, f64)> {
    if !(gap.is_finite() && gap > 0.0 && domain_start.is_finite()) {
        return None;
    }
    let factor = scale_factor(gap);
    let gap_scaled = (gap * factor).round();
    if gap_scaled <= 0.0 {
        return None;
    }
    let start_scaled = round_to(domain_start * factor, KEY_PRECISION).floor();
    let origin = start_scaled - start_scaled.rem_euclid(gap_scaled);
    Some((origin, gap_scaled, factor))
}

/// Largest multiple of `gap` that is `<= domain_start`.
pub fn cell_origin(domain_start: f64, gap: f64) -> f64 {
    match scaled_origin(domain_start, gap) {
        Some((origin, _, factor)) => round_to(origin / factor, KEY_PRECISION),
        None => domain_start,
    }
}

/// Lower edge of the cell containing `value`, scanning from the origin of `domain_start`.
///
/// Returns `None` if `value` lies before the origin or more than
/// [`MAX_SCAN_CELLS`] cells past it.
pub fn resolve_axis(value: f64, domain_start: f64, gap: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let (origin, gap_scaled, factor) = scaled_origin(domain_start, gap)?;
    let target = round_to(value * factor, KEY_PRECISION);
    if target < origin {
        return None;
    }

    let mut index = ((target - origin) / gap_scaled).floor();
    // Settle float noise at the boundaries; lower edge inclusive
    if origin + index * gap_scaled > target {
        index -= 1.0;
    } else if origin + (index + 1.0) * gap_scaled <= target {
        index += 1.0;
    }
    if index < 0.0 || index >= MAX_SCAN_CELLS as f64 {
        return None;
    }

    Some(round_to((origin + index * gap_scaled) / factor, KEY_PRECISION))
}

/// Lower edges of every cell overlapping `domain`, bounded by [`MAX_SCAN_CELLS`].
pub fn grid_lines(domain: &Domain, gap: f64) -> Vec<f64> {
    if domain.is_degenerate() {
        return Vec::new();
    }
    let Some((origin, gap_scaled, factor)) = scaled_origin(domain.min, gap) else {
        return Vec::new();
    };
    (0..MAX_SCAN_CELLS)
        .map(|i| round_to((origin + i as f64 * gap_scaled) / factor, KEY_PRECISION))
        .take_while(|start| *start < domain.max)
        .collect()
}

/// Snaps taps to cells for one trading pair.
#[derive(Debug, Clone, Copy)]
pub struct GridSnapResolver {
    pair: PairConstants,
}

impl GridSnapResolver {
    pub fn new(pair: PairConstants) -> Self {
        Self { pair }
    }

    pub fn pair(&self) -> &PairConstants {
        &self.pair
    }

    /// Cell containing `pos`, aligned from the current domains.
    pub fn resolve(
        &self,
        pos: DomainPos,
        x_domain: &Domain,
        y_domain: &Domain,
    ) -> Option<GridCell> {
        let time = resolve_axis(pos.time, x_domain.min, self.pair.time_gap)?;
        let price = resolve_axis(pos.price, y_domain.min, self.pair.price_gap)?;
        Some(GridCell::new(time, price))
    }

    /// Like [`resolve`](Self::resolve), but refuses cells that have already started.
    pub fn resolve_tap(
        &self,
        pos: DomainPos,
        x_domain: &Domain,
        y_domain: &Domain,
        last_time: Option<i64>,
    ) -> Result<GridCell, SnapRejection> {
        let cell = self
            .resolve(pos, x_domain, y_domain)
            .ok_or(SnapRejection::OutsideGrid)?;
        if let Some(last_time) = last_time {
            if cell.time_start <= last_time as f64 {
                return Err(SnapRejection::Elapsed {
                    cell_time: cell.time_start,
                    last_time,
                });
            }
        }
        Ok(cell)
    }
}
