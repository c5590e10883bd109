//! Purchase history

use thiserror::Error;

use crate::orders::{Order, OrderId};

/// Errors recording an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// An order with this id is already recorded.
    #[error("order {0} is already recorded")]
    DuplicateOrder(OrderId),
}

/// Append-only sink for finalised orders.
pub trait PurchaseHistory {
    /// Append an order.
    ///
    /// # Errors
    ///
    /// Returns a [`HistoryError`] if the order cannot be recorded; nothing is appended.
    fn record(&mut self, order: Order) -> Result<(), HistoryError>;

    /// Recorded orders, oldest first.
    fn orders(&self) -> &[Order];
}

/// Purchase history held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPurchaseHistory {
    orders: Vec<Order>,
}

impl InMemoryPurchaseHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an order by id.
    pub fn find(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id() == id)
    }
}

impl PurchaseHistory for InMemoryPurchaseHistory {
    fn record(&mut self, order: Order) -> Result<(), HistoryError> {
        if self.find(order.id()).is_some() {
            return Err(HistoryError::DuplicateOrder(order.id()));
        }

        self.orders.push(order);

        Ok(())
    }

    fn orders(&self) -> &[Order] {
        &self.orders
    }
}
