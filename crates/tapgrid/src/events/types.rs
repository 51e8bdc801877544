//! Event and command type definitions.
//!
//! - [`ChartEvent`] - things that happened, for the host UI (toasts, status)
//! - [`Command`] - work the engine asks the host to perform
//! - [`TapRejection`] - why a tap did not place an order

use tapgrid_core::{GridCell, OrderRequest};
use thiserror::Error;

use crate::controller::FollowMode;
use crate::snap::SnapRejection;

/// Why a tap was ignored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TapRejection {
    /// The view is panning, recentering or just released.
    #[error("chart is moving")]
    Moving,
    /// No viewport or no feed sample yet.
    #[error("chart is not ready")]
    NotReady,
    #[error(transparent)]
    Snap(#[from] SnapRejection),
}

/// Semantic events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    /// A pending order was inserted for a tapped cell.
    OrderPlaced { temp_id: String, cell: GridCell },
    /// The gateway accepted a pending order.
    OrderConfirmed {
        temp_id: String,
        order_id: String,
        cell: GridCell,
    },
    /// The gateway refused a pending order; it has been removed.
    OrderFailed {
        temp_id: String,
        cell: GridCell,
        reason: String,
    },
    TapRejected(TapRejection),
    ModeChanged { from: FollowMode, to: FollowMode },
    /// Feed connectivity changed.
    FeedStatus { connected: bool },
    PairChanged { symbol: String },
}

/// Requests from the engine to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit this request and report back through `complete_order`.
    SubmitOrder(OrderRequest),
    /// Something visible changed.
    RequestRedraw,
}
