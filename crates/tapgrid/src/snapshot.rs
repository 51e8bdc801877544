//! Per-frame render data.
//!
//! A [`FrameSnapshot`] is everything a renderer needs for one frame, already
//! projected into screen pixels. Ripples are not included; renderers read
//! them from their own [`RippleSubscription`](crate::ripple::RippleSubscription).

use tapgrid_core::{MarkerLayout, OrderGroup, ProbabilityCell};

use crate::controller::FollowMode;
use crate::coords::{CoordinateSystem, ScreenPos, ScreenRect};

/// Marker for one occupied cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMarker {
    pub key: String,
    pub rect: ScreenRect,
    /// Users whose markers are drawn, in placement order.
    pub users: Vec<String>,
    /// Orders beyond the cluster cap that are not drawn.
    pub hidden: usize,
    pub clustered: bool,
    pub pending: bool,
    pub total_amount: f64,
    pub odds: Option<f64>,
}

impl GroupMarker {
    pub fn new(group: &OrderGroup, rect: ScreenRect, max_cluster: usize) -> Option<Self> {
        let (shown, hidden, clustered) = match group.layout(max_cluster)? {
            MarkerLayout::Single(order) => (std::slice::from_ref(order), 0, false),
            MarkerLayout::Cluster { shown, hidden } => (shown, hidden, true),
        };
        Some(Self {
            key: group.key(),
            rect,
            users: shown.iter().map(|o| o.user_id.clone()).collect(),
            hidden,
            clustered,
            pending: group.orders().iter().any(|o| o.is_pending()),
            total_amount: group.total_amount(),
            odds: group.odds(),
        })
    }

    /// Number of orders in the cell, drawn or not.
    pub fn count(&self) -> usize {
        self.users.len() + self.hidden
    }
}

/// Multiplier hint for one free cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMarker {
    pub key: String,
    pub rect: ScreenRect,
    pub multiplier: f64,
}

impl ProbabilityMarker {
    pub fn new(cell: &ProbabilityCell, rect: ScreenRect) -> Self {
        Self {
            key: cell.key(),
            rect,
            multiplier: cell.multiplier,
        }
    }

    pub fn label(&self) -> String {
        format!("{:.2}x", self.multiplier)
    }
}

/// Render data for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub mode: FollowMode,
    pub moving: bool,
    pub coords: CoordinateSystem,
    /// Price line, oldest first, ending at the animated head.
    pub line: Vec<ScreenPos>,
    pub head: Option<ScreenPos>,
    /// Head price formatted with the pair's precision.
    pub head_label: Option<String>,
    /// X pixel of every visible time cell's left edge.
    pub time_lines: Vec<f64>,
    /// Y pixel of every visible price cell's lower edge.
    pub price_lines: Vec<f64>,
    pub groups: Vec<GroupMarker>,
    pub probabilities: Vec<ProbabilityMarker>,
}

impl FrameSnapshot {
    /// Nothing to draw until the viewport and the first sample exist.
    pub fn is_empty(&self) -> bool {
        !self.coords.is_ready() || self.line.is_empty()
    }
}
