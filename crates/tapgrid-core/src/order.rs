//! Orders, per-cell order groups and probability cells.

use serde::{Deserialize, Serialize};

use crate::grid::GridCell;

/// Whether an order is still optimistic or has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Inserted locally on tap, awaiting the gateway.
    #[default]
    Pending,
    /// Acknowledged by the gateway.
    Confirmed,
}

/// A bet placed on one grid cell.
///
/// Pending (optimistic) and confirmed orders share this shape; `status`
/// tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub time_cell_start: f64,
    pub price_cell_start: f64,
    pub amount: f64,
    pub currency: String,
    pub odds: Option<f64>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    pub fn cell(&self) -> GridCell {
        GridCell::new(self.time_cell_start, self.price_cell_start)
    }

    pub fn key(&self) -> String {
        self.cell().key()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Identity used for de-duplication inside a group.
    pub fn same_identity(&self, other: &Order) -> bool {
        self.id == other.id && self.user_id == other.user_id
    }
}

/// Payload handed to the order gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Id of the pending order this request reconciles.
    pub temp_id: String,
    pub time_cell_start: f64,
    pub price_cell_start: f64,
    pub amount: f64,
    pub currency: String,
}

impl OrderRequest {
    pub fn cell(&self) -> GridCell {
        GridCell::new(self.time_cell_start, self.price_cell_start)
    }
}

/// How the renderer should lay out the markers of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerLayout<'a> {
    /// One full-size marker.
    Single(&'a Order),
    /// Small-avatar grid; `hidden` orders beyond the cap are not drawn.
    Cluster { shown: &'a [Order], hidden: usize },
}

/// All orders sharing one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderGroup {
    pub cell: GridCell,
    orders: Vec<Order>,
}

impl OrderGroup {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            orders: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        self.cell.key()
    }

    /// Add an order unless one with the same `(id, user_id)` is present.
    ///
    /// Returns true if the order was added.
    pub fn insert(&mut self, order: Order) -> bool {
        if self.orders.iter().any(|o| o.same_identity(&order)) {
            return false;
        }
        self.orders.push(order);
        true
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Merged stake across all orders in the cell.
    pub fn total_amount(&self) -> f64 {
        self.orders.iter().map(|o| o.amount).sum()
    }

    /// Odds of the most recently added order that carries any.
    pub fn odds(&self) -> Option<f64> {
        self.orders.iter().rev().find_map(|o| o.odds)
    }

    pub fn is_cluster(&self) -> bool {
        self.orders.len() > 1
    }

    /// Marker layout for the renderer, showing at most `max_cluster` orders.
    pub fn layout(&self, max_cluster: usize) -> Option<MarkerLayout<'_>> {
        match self.orders.as_slice() {
            [] => None,
            [only] => Some(MarkerLayout::Single(only)),
            all => {
                let shown = all.len().min(max_cluster);
                Some(MarkerLayout::Cluster {
                    shown: &all[..shown],
                    hidden: all.len() - shown,
                })
            }
        }
    }
}

/// Payout multiplier hint for one visible cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityCell {
    pub time: f64,
    pub price: f64,
    pub multiplier: f64,
}

impl ProbabilityCell {
    pub fn cell(&self) -> GridCell {
        GridCell::new(self.time, self.price)
    }

    pub fn key(&self) -> String {
        self.cell().key()
    }
}
