//! Centralized coordinate system for tapgrid.
//!
//! This module is the single source of truth for domain <-> pixel
//! conversions. It knows two coordinate spaces:
//!
//! - **Screen coordinates** ([`ScreenPos`]): pixels from the top-left of the chart area
//! - **Domain coordinates** ([`DomainPos`]): unix milliseconds and price
//!
//! A [`CoordinateSystem`] is a plain value built fresh for every frame from the
//! controller's domains and the last viewport bounding, so there is no cached
//! scale to invalidate.
//!
//! # Example
//!
//! ```ignore
//! use tapgrid::coords::{CoordinateSystem, ScreenPos};
//!
//! let coords = CoordinateSystem::new(bounding, x_domain, y_domain, 10);
//! let pos = coords.screen_to_domain(ScreenPos::new(320.0, 140.0));
//! println!("tap at t={} price={}", pos.time, pos.price);
//! ```

use tapgrid_core::{Axis, Domain, DomainPos, GridCell, PairConstants, ViewportBounding};

/// Screen coordinates in pixels from the top-left corner of the chart.
///
/// X increases to the right, Y increases downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another screen position.
    #[must_use]
    pub fn distance_to(self, other: ScreenPos) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Calculate squared distance (faster than distance_to when only comparing).
    #[must_use]
    pub fn distance_squared_to(self, other: ScreenPos) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub origin: ScreenPos,
    pub width: f64,
    pub height: f64,
}

/// Domain/pixel mapping for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSystem {
    pub bounding: ViewportBounding,
    pub x_domain: Domain,
    pub y_domain: Domain,
    /// Pixels per grid cell, shared by both axes.
    pub grid_size: f64,
}

impl CoordinateSystem {
    /// Create a coordinate system for the given viewport and domains.
    #[must_use]
    pub fn new(
        bounding: ViewportBounding,
        x_domain: Domain,
        y_domain: Domain,
        grid_rows: u32,
    ) -> Self {
        Self {
            bounding,
            x_domain,
            y_domain,
            grid_size: bounding.grid_size(grid_rows),
        }
    }

    #[must_use]
    pub fn domain(&self, axis: Axis) -> Domain {
        match axis {
            Axis::Time => self.x_domain,
            Axis::Price => self.y_domain,
        }
    }

    /// True once both domains and the viewport are usable.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scale(Axis::Time) > 0.0 && self.scale(Axis::Price) > 0.0
    }

    /// Pixels per domain unit. Zero while the domain or viewport is degenerate.
    #[must_use]
    pub fn scale(&self, axis: Axis) -> f64 {
        let domain = self.domain(axis);
        let range = self.bounding.extent(axis);
        if domain.is_degenerate() || !(range.is_finite() && range > 0.0) {
            return 0.0;
        }
        range / domain.width()
    }

    // =========================================================================
    // Single-axis conversions
    // =========================================================================

    /// Domain value to pixel offset along `axis`.
    ///
    /// The price axis is inverted: pixel 0 is `y_domain.max`.
    #[must_use]
    pub fn to_pixel(&self, axis: Axis, value: f64) -> f64 {
        let scale = self.scale(axis);
        if scale == 0.0 {
            return 0.0;
        }
        let domain = self.domain(axis);
        match axis {
            Axis::Time => (value - domain.min) * scale,
            Axis::Price => (domain.max - value) * scale,
        }
    }

    /// Pixel offset along `axis` to domain value. Inverse of [`to_pixel`](Self::to_pixel).
    #[must_use]
    pub fn to_domain_value(&self, axis: Axis, pixel: f64) -> f64 {
        let scale = self.scale(axis);
        let domain = self.domain(axis);
        if scale == 0.0 {
            return domain.min;
        }
        match axis {
            Axis::Time => domain.min + pixel / scale,
            Axis::Price => domain.max - pixel / scale,
        }
    }

    // =========================================================================
    // Point conversions
    // =========================================================================

    #[must_use]
    pub fn screen_to_domain(&self, screen: ScreenPos) -> DomainPos {
        DomainPos::new(
            self.to_domain_value(Axis::Time, screen.x),
            self.to_domain_value(Axis::Price, screen.y),
        )
    }

    #[must_use]
    pub fn domain_to_screen(&self, pos: DomainPos) -> ScreenPos {
        ScreenPos::new(
            self.to_pixel(Axis::Time, pos.time),
            self.to_pixel(Axis::Price, pos.price),
        )
    }

    /// Pixel rectangle covered by a grid cell.
    #[must_use]
    pub fn cell_rect(&self, cell: &GridCell, pair: &PairConstants) -> ScreenRect {
        let left = self.to_pixel(Axis::Time, cell.time_start);
        let right = self.to_pixel(Axis::Time, cell.time_start + pair.time_gap);
        let top = self.to_pixel(Axis::Price, cell.price_start + pair.price_gap);
        let bottom = self.to_pixel(Axis::Price, cell.price_start);
        ScreenRect {
            origin: ScreenPos::new(left, top),
            width: right - left,
            height: bottom - top,
        }
    }

    // =========================================================================
    // Utility methods
    // =========================================================================

    /// Domain width that fills the viewport along `axis` at one `gap` per grid cell.
    #[must_use]
    pub fn window_width(&self, axis: Axis, gap: f64) -> f64 {
        window_width(self.bounding, self.grid_size, axis, gap)
    }

    /// Convert a pixel delta to a domain delta at one `gap` per grid cell.
    #[must_use]
    pub fn pixel_delta_to_domain(&self, pixel_delta: f64, gap: f64) -> f64 {
        pixel_delta_to_domain(self.grid_size, pixel_delta, gap)
    }

    /// Check if a screen position is within the chart area.
    #[must_use]
    pub fn is_in_chart_area(&self, screen: ScreenPos) -> bool {
        screen.x >= 0.0
            && screen.x < self.bounding.width
            && screen.y >= 0.0
            && screen.y < self.bounding.height
    }
}

/// Domain width filling `bounding` along `axis`; zero until the grid has a size.
pub(crate) fn window_width(
    bounding: ViewportBounding,
    grid_size: f64,
    axis: Axis,
    gap: f64,
) -> f64 {
    if grid_size <= 0.0 {
        return 0.0;
    }
    bounding.extent(axis) / grid_size * gap
}

/// `pixel_delta / grid_size * gap`; zero until the grid has a size.
pub(crate) fn pixel_delta_to_domain(grid_size: f64, pixel_delta: f64, gap: f64) -> f64 {
    if grid_size <= 0.0 {
        return 0.0;
    }
    pixel_delta / grid_size * gap
}
