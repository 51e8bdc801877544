//! Drag gestures to domain changes.

use std::time::{Duration, Instant};

use tapgrid_core::{Domain, PairConstants};

use crate::controller::{ChartController, FollowMode};
use crate::coords::pixel_delta_to_domain;

/// Domains captured at pan start plus the pointer travel since then.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    pub start_x_domain: Domain,
    pub start_y_domain: Domain,
    pub moving: bool,
    offset_x: f64,
    offset_y: f64,
}

impl PanSession {
    fn new(x_domain: Domain, y_domain: Domain) -> Self {
        Self {
            start_x_domain: x_domain,
            start_y_domain: y_domain,
            moving: true,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Applies drags to a [`ChartController`].
///
/// Content follows the pointer: dragging right reveals earlier times and
/// dragging down reveals higher prices.
#[derive(Debug, Clone)]
pub struct PanController {
    session: Option<PanSession>,
    grace: Duration,
}

impl PanController {
    /// `grace` is how long taps stay suppressed after release.
    pub fn new(grace: Duration) -> Self {
        Self {
            session: None,
            grace,
        }
    }

    pub fn session(&self) -> Option<&PanSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Begin a pan. Ignored while a recenter is animating.
    pub fn start(&mut self, ctrl: &mut ChartController) -> bool {
        if ctrl.mode() == FollowMode::Recentering {
            log::debug!("pan start ignored while recentering");
            return false;
        }
        if ctrl.x_domain().is_degenerate() || ctrl.y_domain().is_degenerate() {
            return false;
        }
        self.session = Some(PanSession::new(ctrl.x_domain(), ctrl.y_domain()));
        ctrl.set_moving(true);
        ctrl.set_mode(FollowMode::Panning);
        true
    }

    /// Apply a pointer delta.
    ///
    /// Deltas accumulate in the session and the domains are recomputed from
    /// the snapshot, so each call is O(1) regardless of drag length. The time
    /// domain's left edge never moves before `first_time`.
    pub fn move_by(
        &mut self,
        ctrl: &mut ChartController,
        dx: f64,
        dy: f64,
        grid_size: f64,
        pair: &PairConstants,
        first_time: Option<f64>,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if grid_size <= 0.0 {
            return false;
        }

        session.offset_x += dx;
        session.offset_y += dy;

        let time_delta = pixel_delta_to_domain(grid_size, session.offset_x, pair.time_gap);
        let mut x_domain = session.start_x_domain.shifted(-time_delta);
        if let Some(first) = first_time {
            if x_domain.min < first {
                x_domain = x_domain.clamp_min_to(first);
                // Keep the offset at the wall so reversing responds at once
                session.offset_x = (session.start_x_domain.min - first) / pair.time_gap * grid_size;
            }
        }

        let price_delta = pixel_delta_to_domain(grid_size, session.offset_y, pair.price_gap);
        let y_domain = session.start_y_domain.shifted(price_delta);

        ctrl.set_domains(x_domain, y_domain);
        true
    }

    /// Finish the pan. The domains stay where they are and the mode stays manual.
    pub fn end(&mut self, ctrl: &mut ChartController, now: Instant) -> bool {
        if self.session.take().is_none() {
            return false;
        }
        ctrl.release_moving(now, self.grace);
        true
    }

    /// Restart the session from the controller's current domains.
    ///
    /// Needed when the domains change under a live drag, e.g. on resize,
    /// since the stored offset is only valid for the old grid size.
    pub fn rebase(&mut self, ctrl: &ChartController) {
        if let Some(session) = self.session.as_mut() {
            session.start_x_domain = ctrl.x_domain();
            session.start_y_domain = ctrl.y_domain();
            session.offset_x = 0.0;
            session.offset_y = 0.0;
        }
    }

    /// Drop the session without touching the controller.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}
