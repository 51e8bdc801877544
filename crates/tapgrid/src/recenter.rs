//! Eased transition from a panned view back to the live point.

use std::time::{Duration, Instant};

use tapgrid_core::{Domain, DomainPos, PairConstants};

use crate::controller::{ChartController, FollowMode};
use crate::tween::{Easing, Scheduler, TweenFrame, TweenHandle};

/// Domains the view returns to: `point` centered in a window of the given widths.
pub fn recenter_target(
    point: DomainPos,
    time_window: f64,
    price_window: f64,
) -> Option<(Domain, Domain)> {
    if !(time_window > 0.0 && price_window > 0.0) {
        return None;
    }
    Some((
        Domain::around(point.time, time_window),
        Domain::around(point.price, price_window),
    ))
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    handle: TweenHandle,
    from: (Domain, Domain),
    to: (Domain, Domain),
}

/// Drives both domains toward the recenter target.
#[derive(Debug, Clone)]
pub struct RecenterAnimator {
    duration: Duration,
    snap_duration: Duration,
    snap_threshold_cells: f64,
    flight: Option<Flight>,
}

impl RecenterAnimator {
    pub fn new(duration: Duration, snap_duration: Duration, snap_threshold_cells: f64) -> Self {
        Self {
            duration,
            snap_duration,
            snap_threshold_cells,
            flight: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.flight.is_some()
    }

    /// Target domains of the running recenter.
    pub fn target(&self) -> Option<(Domain, Domain)> {
        self.flight.map(|f| f.to)
    }

    /// Start recentering on `point`.
    ///
    /// When the view is already within the snap threshold on both axes the
    /// transition uses the short snap duration instead of the full animation.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        ctrl: &mut ChartController,
        scheduler: &mut Scheduler,
        point: DomainPos,
        time_window: f64,
        price_window: f64,
        pair: &PairConstants,
        now: Instant,
    ) -> bool {
        let Some(target) = recenter_target(point, time_window, price_window) else {
            return false;
        };
        self.cancel(scheduler);

        let from = (ctrl.x_domain(), ctrl.y_domain());
        let reach_x = self.snap_threshold_cells * pair.time_gap;
        let reach_y = self.snap_threshold_cells * pair.price_gap;
        let near = !from.0.is_degenerate()
            && !from.1.is_degenerate()
            && (from.0.center() - target.0.center()).abs() <= reach_x
            && (from.1.center() - target.1.center()).abs() <= reach_y;
        let duration = if near { self.snap_duration } else { self.duration };
        log::debug!("recenter over {duration:?} (near: {near})");

        let handle = scheduler.start(vec![0.0], vec![1.0], duration, Easing::EaseInOut, now);
        self.flight = Some(Flight {
            handle,
            from,
            to: target,
        });
        ctrl.set_moving(true);
        ctrl.set_mode(FollowMode::Recentering);
        true
    }

    /// Consume a scheduler frame. Returns true when the recenter completed on this frame.
    pub fn apply(&mut self, frame: &TweenFrame, ctrl: &mut ChartController) -> bool {
        let Some(flight) = self.flight else {
            return false;
        };
        if flight.handle != frame.handle {
            return false;
        }

        if frame.finished {
            self.flight = None;
            ctrl.set_domains(flight.to.0, flight.to.1);
            ctrl.set_moving(false);
            ctrl.set_mode(FollowMode::Following);
            return true;
        }

        let (from_x, from_y) = flight.from;
        let (to_x, to_y) = flight.to;
        if from_x.is_degenerate() || from_y.is_degenerate() {
            ctrl.set_domains(to_x, to_y);
        } else {
            ctrl.set_domains(from_x.lerp(&to_x, frame.eased), from_y.lerp(&to_y, frame.eased));
        }
        false
    }

    /// Rewrite both ends of a running flight to new window widths.
    ///
    /// The tween keeps its progress; only the widths being interpolated change.
    pub fn resize(&mut self, time_window: f64, price_window: f64) {
        if !(time_window > 0.0 && price_window > 0.0) {
            return;
        }
        let Some(flight) = self.flight.as_mut() else {
            return;
        };
        let fit = |d: Domain, width: f64| {
            if d.is_degenerate() {
                d
            } else {
                d.with_width(width)
            }
        };
        flight.from = (fit(flight.from.0, time_window), fit(flight.from.1, price_window));
        flight.to = (fit(flight.to.0, time_window), fit(flight.to.1, price_window));
    }

    /// Abort a running recenter, leaving the domains wherever they are.
    pub fn cancel(&mut self, scheduler: &mut Scheduler) {
        if let Some(flight) = self.flight.take() {
            scheduler.cancel(flight.handle);
        }
    }
}
