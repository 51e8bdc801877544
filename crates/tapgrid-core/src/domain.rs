//! Axis ranges and viewport geometry.

/// One of the two chart axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis, unix milliseconds.
    Time,
    /// Vertical axis, price units.
    Price,
}

/// A point in domain space (time in ms, price).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DomainPos {
    pub time: f64,
    pub price: f64,
}

impl DomainPos {
    pub const fn new(time: f64, price: f64) -> Self {
        Self { time, price }
    }
}

/// Continuous `[min, max]` value range mapped onto one axis.
///
/// A domain with `max <= min` is degenerate. That is the state before the
/// first feed sample arrives, and every consumer treats it as "nothing to draw".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Domain of the given width centered on `center`.
    pub fn around(center: f64, width: f64) -> Self {
        let half = width / 2.0;
        Self::new(center - half, center + half)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// True when the domain cannot be used for scale math.
    pub fn is_degenerate(&self) -> bool {
        !(self.max > self.min) || !self.min.is_finite() || !self.max.is_finite()
    }

    /// Half-open containment, `min <= value < max`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    /// Whether `[start, start + len)` overlaps this domain.
    pub fn overlaps(&self, start: f64, len: f64) -> bool {
        start < self.max && start + len > self.min
    }

    /// The same domain moved by `delta`.
    #[must_use]
    pub fn shifted(&self, delta: f64) -> Self {
        Self::new(self.min + delta, self.max + delta)
    }

    /// Same width, re-centered on `center`.
    #[must_use]
    pub fn recentered(&self, center: f64) -> Self {
        Self::around(center, self.width())
    }

    /// Same center, new width.
    #[must_use]
    pub fn with_width(&self, width: f64) -> Self {
        Self::around(self.center(), width)
    }

    /// Linear interpolation toward `to`; `t = 1` yields `to` exactly.
    #[must_use]
    pub fn lerp(&self, to: &Domain, t: f64) -> Self {
        if t >= 1.0 {
            return *to;
        }
        Self::new(
            self.min + (to.min - self.min) * t,
            self.max + (to.max - self.max) * t,
        )
    }

    /// Push the domain right so its left edge is not before `edge`.
    #[must_use]
    pub fn clamp_min_to(&self, edge: f64) -> Self {
        if self.min < edge {
            self.shifted(edge - self.min)
        } else {
            *self
        }
    }
}

/// Pixel size of the chart area, as reported by the host's resize observer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportBounding {
    pub width: f64,
    pub height: f64,
}

impl ViewportBounding {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel extent along an axis.
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Time => self.width,
            Axis::Price => self.height,
        }
    }

    /// Pixels per grid cell, `floor(height / rows)`. Shared by both axes.
    pub fn grid_size(&self, rows: u32) -> f64 {
        if rows == 0 || !self.height.is_finite() || self.height <= 0.0 {
            return 0.0;
        }
        (self.height / rows as f64).floor()
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_domains() {
        assert!(Domain::default().is_degenerate());
        assert!(Domain::new(5.0, 5.0).is_degenerate());
        assert!(Domain::new(6.0, 5.0).is_degenerate());
        assert!(Domain::new(f64::NAN, 5.0).is_degenerate());
        assert!(!Domain::new(4.0, 5.0).is_degenerate());
    }

    #[test]
    fn test_around_and_center() {
        let d = Domain::around(100.0, 20.0);
        assert_eq!(d.min, 90.0);
        assert_eq!(d.max, 110.0);
        assert_eq!(d.center(), 100.0);
        assert_eq!(d.width(), 20.0);
        assert_eq!(d.with_width(40.0), Domain::new(80.0, 120.0));
    }

    #[test]
    fn test_lerp_reaches_target() {
        let from = Domain::new(0.0, 10.0);
        let to = Domain::new(100.0, 110.0);
        assert_eq!(from.lerp(&to, 0.0), from);
        assert_eq!(from.lerp(&to, 0.5), Domain::new(50.0, 60.0));
        assert_eq!(from.lerp(&to, 1.0), to);
    }

    #[test]
    fn test_clamp_min_keeps_width() {
        let d = Domain::new(-50.0, 50.0).clamp_min_to(0.0);
        assert_eq!(d, Domain::new(0.0, 100.0));
        let untouched = Domain::new(10.0, 20.0).clamp_min_to(0.0);
        assert_eq!(untouched, Domain::new(10.0, 20.0));
    }

    #[test]
    fn test_overlaps() {
        let d = Domain::new(100.0, 101.0);
        assert!(d.overlaps(99.5, 0.6));
        assert!(!d.overlaps(99.0, 1.0));
        assert!(!d.overlaps(101.0, 0.5));
    }

    #[test]
    fn test_grid_size_floors() {
        let vp = ViewportBounding::new(800.0, 605.0);
        assert_eq!(vp.grid_size(10), 60.0);
        assert_eq!(vp.grid_size(0), 0.0);
        assert_eq!(ViewportBounding::default().grid_size(10), 0.0);
    }
}
