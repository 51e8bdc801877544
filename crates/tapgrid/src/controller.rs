//! Per-engine view state: the two domains, the follow/pan mode and the
//! advisory `moving` flag.

use std::fmt;
use std::time::{Duration, Instant};

use tapgrid_core::{Domain, DomainPos};

/// Who currently owns the domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowMode {
    /// Domains track the latest rendered point.
    #[default]
    Following,
    /// The user dragged away; domains stay where the pan left them.
    Panning,
    /// An eased transition back to the live point is running.
    Recentering,
}

impl fmt::Display for FollowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FollowMode::Following => "following",
            FollowMode::Panning => "panning",
            FollowMode::Recentering => "recentering",
        };
        f.write_str(name)
    }
}

/// Mutable view state of one chart.
///
/// The `moving` flag suppresses taps while the view is in motion. It is only
/// meaningful because input, animation and rendering share one thread.
#[derive(Debug, Clone, Default)]
pub struct ChartController {
    x_domain: Domain,
    y_domain: Domain,
    mode: FollowMode,
    moving: bool,
    release_at: Option<Instant>,
}

impl ChartController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x_domain(&self) -> Domain {
        self.x_domain
    }

    pub fn y_domain(&self) -> Domain {
        self.y_domain
    }

    pub fn set_domains(&mut self, x_domain: Domain, y_domain: Domain) {
        self.x_domain = x_domain;
        self.y_domain = y_domain;
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    /// Switch mode. Returns true if the mode actually changed.
    pub fn set_mode(&mut self, mode: FollowMode) -> bool {
        if self.mode == mode {
            return false;
        }
        log::debug!("chart mode {} -> {}", self.mode, mode);
        self.mode = mode;
        true
    }

    /// Whether taps should currently be ignored.
    pub fn is_moving(&self, now: Instant) -> bool {
        self.moving || self.release_at.is_some_and(|until| now < until)
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.moving = moving;
        self.release_at = None;
    }

    /// Clear `moving`, but keep reporting motion for `grace` after `now`.
    pub fn release_moving(&mut self, now: Instant, grace: Duration) {
        self.moving = false;
        self.release_at = Some(now + grace);
    }

    /// Back to the pre-first-tick state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Give both domains new widths around their current centers.
    ///
    /// Used when the viewport changes outside of follow mode so cells stay
    /// square. Degenerate domains are left alone. Returns true if anything
    /// changed.
    pub fn resize(&mut self, time_window: f64, price_window: f64) -> bool {
        if !(time_window > 0.0 && price_window > 0.0) {
            return false;
        }
        let before = (self.x_domain, self.y_domain);
        if !self.x_domain.is_degenerate() {
            self.x_domain = self.x_domain.with_width(time_window);
        }
        if !self.y_domain.is_degenerate() {
            self.y_domain = self.y_domain.with_width(price_window);
        }
        before != (self.x_domain, self.y_domain)
    }

    /// Keep `point` in view while following.
    ///
    /// The time domain is centered on the point. The price domain only moves
    /// when the point leaves the inner band left after trimming `padding` of
    /// the window from each side, and then by the overshoot. Returns true if
    /// the domains were updated.
    pub fn follow(
        &mut self,
        point: DomainPos,
        time_window: f64,
        price_window: f64,
        padding: f64,
    ) -> bool {
        if self.mode != FollowMode::Following || !(time_window > 0.0 && price_window > 0.0) {
            return false;
        }

        self.x_domain = Domain::around(point.time, time_window);

        let resized = (self.y_domain.width() - price_window).abs() > price_window * 1e-9;
        if self.y_domain.is_degenerate() || resized {
            self.y_domain = Domain::around(point.price, price_window);
            return true;
        }

        let band = price_window * padding.clamp(0.0, 0.5);
        let upper = self.y_domain.max - band;
        let lower = self.y_domain.min + band;
        if point.price > upper {
            self.y_domain = self.y_domain.shifted(point.price - upper);
        } else if point.price < lower {
            self.y_domain = self.y_domain.shifted(point.price - lower);
        }
        true
    }
}
