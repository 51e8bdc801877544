//! Order submission boundary.

use tapgrid_core::{Order, OrderRequest, OrderStatus};
use thiserror::Error;

/// Reasons an order submission can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The backend refused the order.
    #[error("order rejected: {0}")]
    Rejected(String),
    /// The request never got an answer.
    #[error("order submission timed out")]
    Timeout,
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Anything that can turn an [`OrderRequest`] into a confirmed [`Order`].
pub trait OrderGateway {
    fn submit(&self, request: &OrderRequest) -> Result<Order, SubmitError>;
}

/// In-process gateway that confirms every valid request.
///
/// Used by the demo binary and tests in place of a real backend.
#[derive(Debug, Clone)]
pub struct PaperGateway {
    user_id: String,
    max_amount: f64,
}

impl PaperGateway {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            max_amount: f64::INFINITY,
        }
    }

    /// Reject stakes above `max_amount`.
    pub fn with_max_amount(mut self, max_amount: f64) -> Self {
        self.max_amount = max_amount;
        self
    }
}

impl OrderGateway for PaperGateway {
    fn submit(&self, request: &OrderRequest) -> Result<Order, SubmitError> {
        if !(request.amount.is_finite() && request.amount > 0.0) {
            return Err(SubmitError::Rejected(format!(
                "invalid amount {}",
                request.amount
            )));
        }
        if request.amount > self.max_amount {
            return Err(SubmitError::Rejected(format!(
                "amount {} exceeds limit {}",
                request.amount, self.max_amount
            )));
        }

        Ok(Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            time_cell_start: request.time_cell_start,
            price_cell_start: request.price_cell_start,
            amount: request.amount,
            currency: request.currency.clone(),
            odds: None,
            status: OrderStatus::Confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: f64) -> OrderRequest {
        OrderRequest {
            temp_id: "tmp".to_string(),
            time_cell_start: 3_000.0,
            price_cell_start: 100.5,
            amount,
            currency: "USDT".to_string(),
        }
    }

    #[test]
    fn test_paper_gateway_confirms() {
        let gateway = PaperGateway::new("alice");
        let order = gateway.submit(&request(10.0)).unwrap();
        assert_eq!(order.user_id, "alice");
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.key(), "3000-100.5");
        assert_ne!(order.id, "tmp");
    }

    #[test]
    fn test_paper_gateway_rejects() {
        let gateway = PaperGateway::new("alice").with_max_amount(5.0);
        assert!(matches!(
            gateway.submit(&request(10.0)),
            Err(SubmitError::Rejected(_))
        ));
        assert!(gateway.submit(&request(-1.0)).is_err());
    }
}
