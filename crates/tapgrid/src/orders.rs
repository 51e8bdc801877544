//! Order book and per-cell aggregation for rendering.

use std::collections::{HashMap, HashSet};

use tapgrid_core::{Domain, GridCell, Order, OrderGroup, OrderRequest, OrderStatus, ProbabilityCell};

/// Group visible orders by cell.
///
/// Orders whose price cell does not intersect `y_domain` are left out.
/// Groups keep first-seen order, and duplicate `(id, user_id)` pairs collapse
/// into one entry.
pub fn aggregate(orders: &[Order], y_domain: &Domain, price_gap: f64) -> Vec<OrderGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<OrderGroup> = Vec::new();

    for order in orders {
        if !y_domain.overlaps(order.price_cell_start, price_gap) {
            continue;
        }
        let key = order.key();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(OrderGroup::new(order.cell()));
            groups.len() - 1
        });
        groups[slot].insert(order.clone());
    }
    groups
}

/// Probability cells minus those already occupied by an order group.
pub fn merge_probabilities(
    cells: &[ProbabilityCell],
    groups: &[OrderGroup],
) -> Vec<ProbabilityCell> {
    let taken: HashSet<String> = groups.iter().map(OrderGroup::key).collect();
    cells
        .iter()
        .filter(|cell| !taken.contains(&cell.key()))
        .copied()
        .collect()
}

/// All known orders of the current pair, pending and confirmed.
///
/// Groups are rebuilt lazily the next time they are read after the order
/// set or the visible price window changed.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: Vec<Order>,
    groups: Vec<OrderGroup>,
    grouped_for: Option<(Domain, f64)>,
    dirty: bool,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an optimistic order for `cell` and build the matching gateway request.
    pub fn place(
        &mut self,
        cell: GridCell,
        amount: f64,
        currency: &str,
        user_id: &str,
        odds: Option<f64>,
    ) -> OrderRequest {
        let temp_id = format!("tmp-{}", uuid::Uuid::new_v4());
        self.orders.push(Order {
            id: temp_id.clone(),
            user_id: user_id.to_string(),
            time_cell_start: cell.time_start,
            price_cell_start: cell.price_start,
            amount,
            currency: currency.to_string(),
            odds,
            status: OrderStatus::Pending,
        });
        self.dirty = true;

        OrderRequest {
            temp_id,
            time_cell_start: cell.time_start,
            price_cell_start: cell.price_start,
            amount,
            currency: currency.to_string(),
        }
    }

    /// Replace the pending order `temp_id` with its confirmed counterpart.
    ///
    /// The pending order's odds carry over if the confirmation has none.
    /// Returns false if no such pending order exists (e.g. after a pair switch).
    pub fn confirm(&mut self, temp_id: &str, mut order: Order) -> bool {
        let Some(pos) = self.pending_position(temp_id) else {
            return false;
        };
        let pending = self.orders.remove(pos);
        order.odds = order.odds.or(pending.odds);
        order.status = OrderStatus::Confirmed;
        self.upsert(order);
        true
    }

    /// Drop the pending order `temp_id`.
    pub fn reject(&mut self, temp_id: &str) -> Option<Order> {
        let pos = self.pending_position(temp_id)?;
        self.dirty = true;
        Some(self.orders.remove(pos))
    }

    /// Insert or replace an order by `(id, user_id)`, e.g. one placed by another user.
    pub fn upsert(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.same_identity(&order)) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
        self.dirty = true;
    }

    pub fn get(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn pending_count(&self) -> usize {
        self.orders.iter().filter(|o| o.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
        self.groups.clear();
        self.grouped_for = None;
        self.dirty = false;
    }

    /// Visible groups for the given price window.
    pub fn groups(&mut self, y_domain: &Domain, price_gap: f64) -> &[OrderGroup] {
        let key = (*y_domain, price_gap);
        if self.dirty || self.grouped_for != Some(key) {
            self.groups = aggregate(&self.orders, y_domain, price_gap);
            self.grouped_for = Some(key);
            self.dirty = false;
        }
        &self.groups
    }

    fn pending_position(&self, temp_id: &str) -> Option<usize> {
        self.orders
            .iter()
            .position(|o| o.id == temp_id && o.is_pending())
    }
}
