//! Shared interpolation driver.
//!
//! Feed smoothing and the recenter animation are tweens owned by one
//! [`Scheduler`] per engine. The host advances the scheduler with
//! [`Scheduler::tick`]; each live tween yields a [`TweenFrame`] and finished
//! tweens are dropped after their final frame.

use std::time::{Duration, Instant};

/// Easing curve applied to the linear progress of a tween.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    /// Cubic ease-in-out.
    EaseInOut,
}

impl Easing {
    /// Map linear progress in `[0, 1]` to eased progress in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Identifies a tween for cancellation and frame routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenHandle(u64);

/// State of one tween after a scheduler tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenFrame {
    pub handle: TweenHandle,
    /// Linear progress, non-decreasing, exactly `1.0` on the last frame.
    pub fraction: f64,
    /// Progress after easing.
    pub eased: f64,
    /// Interpolated values; equal to the target values on the last frame.
    pub values: Vec<f64>,
    pub finished: bool,
}

#[derive(Debug)]
struct Tween {
    handle: TweenHandle,
    from: Vec<f64>,
    to: Vec<f64>,
    started: Instant,
    duration: Duration,
    easing: Easing,
    fraction: f64,
}

impl Tween {
    fn advance(&mut self, now: Instant) -> TweenFrame {
        let linear = if self.duration.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_duration_since(self.started);
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
        };
        // Never step backwards even if the host clock does
        self.fraction = self.fraction.max(linear);

        let finished = self.fraction >= 1.0;
        let eased = if finished { 1.0 } else { self.easing.apply(self.fraction) };
        let values = if finished {
            self.to.clone()
        } else {
            self.from
                .iter()
                .zip(&self.to)
                .map(|(from, to)| from + (to - from) * eased)
                .collect()
        };

        TweenFrame {
            handle: self.handle,
            fraction: self.fraction,
            eased,
            values,
            finished,
        }
    }
}

/// Owner of all running tweens of one engine.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    tweens: Vec<Tween>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start interpolating `from` toward `to` over `duration`.
    ///
    /// Both slices are expected to have the same length; extra values on
    /// either side are ignored until the final frame, which reports `to`.
    pub fn start(
        &mut self,
        from: Vec<f64>,
        to: Vec<f64>,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) -> TweenHandle {
        self.next_id += 1;
        let handle = TweenHandle(self.next_id);
        self.tweens.push(Tween {
            handle,
            from,
            to,
            started: now,
            duration,
            easing,
            fraction: 0.0,
        });
        handle
    }

    /// Stop a tween without emitting a final frame. Returns false if it had already finished.
    pub fn cancel(&mut self, handle: TweenHandle) -> bool {
        let before = self.tweens.len();
        self.tweens.retain(|t| t.handle != handle);
        self.tweens.len() != before
    }

    pub fn is_active(&self, handle: TweenHandle) -> bool {
        self.tweens.iter().any(|t| t.handle == handle)
    }

    /// Drop every tween.
    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Advance all tweens to `now`, in start order.
    pub fn tick(&mut self, now: Instant) -> Vec<TweenFrame> {
        let frames: Vec<TweenFrame> = self.tweens.iter_mut().map(|t| t.advance(now)).collect();
        self.tweens.retain(|t| t.fraction < 1.0);
        frames
    }
}
