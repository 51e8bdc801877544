//! Turns fixed-cadence feed ticks into a continuously moving point.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tapgrid_core::{DomainPos, Kline};

use crate::tween::{Easing, Scheduler, TweenFrame, TweenHandle};

/// Bounded feed history plus the animated head of the line.
///
/// Each accepted tick starts a linear tween from the previous real point to
/// the new one lasting one feed interval. A tick arriving mid-tween cancels
/// the running tween and restarts from the previous real point.
#[derive(Debug)]
pub struct KlineFeedSmoother {
    points: VecDeque<Kline>,
    max_points: usize,
    duration: Duration,
    animated: Option<DomainPos>,
    tween: Option<TweenHandle>,
}

impl KlineFeedSmoother {
    pub fn new(duration: Duration, max_points: usize) -> Self {
        Self {
            points: VecDeque::new(),
            max_points: max_points.max(2),
            duration,
            animated: None,
            tween: None,
        }
    }

    /// Feed a new sample. Returns false if it was dropped.
    pub fn push(&mut self, kline: Kline, scheduler: &mut Scheduler, now: Instant) -> bool {
        if !kline.is_valid() {
            log::warn!("dropping invalid sample {kline:?}");
            return false;
        }
        if let Some(last) = self.points.back() {
            if !kline.follows(last) {
                log::debug!("dropping stale sample t={} (last t={})", kline.time, last.time);
                return false;
            }
        }

        if let Some(handle) = self.tween.take() {
            scheduler.cancel(handle);
        }

        let previous = self.points.back().copied();
        self.points.push_back(kline);
        while self.points.len() > self.max_points {
            self.points.pop_front();
        }

        match previous {
            Some(prev) => {
                let from = prev.pos();
                let to = kline.pos();
                self.animated = Some(from);
                self.tween = Some(scheduler.start(
                    vec![from.time, from.price],
                    vec![to.time, to.price],
                    self.duration,
                    Easing::Linear,
                    now,
                ));
            }
            None => self.animated = Some(kline.pos()),
        }
        true
    }

    /// Consume a scheduler frame. Returns true if the frame belonged to this smoother.
    pub fn apply(&mut self, frame: &TweenFrame) -> bool {
        if self.tween != Some(frame.handle) {
            return false;
        }
        if let [time, price] = frame.values[..] {
            self.animated = Some(DomainPos::new(time, price));
        }
        if frame.finished {
            self.tween = None;
        }
        true
    }

    /// Head of the rendered line, available as soon as one sample arrived.
    pub fn last_rendered_point(&self) -> Option<DomainPos> {
        self.animated
    }

    /// Polyline for the renderer: every settled sample followed by the animated head.
    pub fn rendered_points(&self) -> Vec<DomainPos> {
        let settled = self.points.len().saturating_sub(1);
        self.points
            .iter()
            .take(settled)
            .map(Kline::pos)
            .chain(self.animated)
            .collect()
    }

    pub fn last_kline(&self) -> Option<&Kline> {
        self.points.back()
    }

    /// Time of the oldest retained sample.
    pub fn first_time(&self) -> Option<i64> {
        self.points.front().map(|k| k.time)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Forget all samples and cancel the running tween.
    pub fn clear(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.tween.take() {
            scheduler.cancel(handle);
        }
        self.points.clear();
        self.animated = None;
    }
}
