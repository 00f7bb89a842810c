//! Represents an order record as kept by the order service.
//!
//! # Record Store
//! This struct implements [`StoreEntity`](crate::store::StoreEntity), so an in-process
//! [`RecordActor`](crate::store::RecordActor) can own it. Its only action is
//! [`OrderAction::SetStatus`], which refuses any transition that would move the status
//! backward or from one terminal state to another.

use crate::model::{CartLine, CartSnapshot, PaymentMethod};
use crate::store::StoreEntity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Processing => 1,
            OrderStatus::Completed | OrderStatus::Cancelled => 2,
        }
    }

    /// Monotonic transition rule. Re-applying the current status is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self == next || (!self.is_terminal() && next.rank() > self.rank())
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Payload for creating a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub method: PaymentMethod,
    pub line_items: Vec<CartLine>,
    pub total_due: Decimal,
}

impl OrderDraft {
    /// Freezes the cart's lines and total.
    pub fn from_cart(method: PaymentMethod, cart: &CartSnapshot) -> Self {
        Self {
            method,
            line_items: cart.lines().to_vec(),
            total_due: cart.total_due(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub method: PaymentMethod,
    pub line_items: Vec<CartLine>,
    pub total_due: Decimal,
    pub status: OrderStatus,
    /// Every status the order has held, oldest first.
    pub history: Vec<OrderStatus>,
}

#[derive(Debug, Clone)]
pub enum OrderAction {
    SetStatus(OrderStatus),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderRecordError {
    #[error("order has no line items")]
    EmptyOrder,
    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

impl StoreEntity for Order {
    type Id = OrderId;
    type Create = OrderDraft;
    type Action = OrderAction;
    /// The status held before the action.
    type ActionResult = OrderStatus;
    type Error = OrderRecordError;

    fn from_create(id: OrderId, draft: OrderDraft) -> Result<Self, Self::Error> {
        if draft.line_items.iter().all(|line| line.quantity == 0) {
            return Err(OrderRecordError::EmptyOrder);
        }
        Ok(Self {
            id,
            method: draft.method,
            line_items: draft.line_items,
            total_due: draft.total_due,
            status: OrderStatus::Pending,
            history: vec![OrderStatus::Pending],
        })
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderStatus, Self::Error> {
        match action {
            OrderAction::SetStatus(next) => {
                let previous = self.status;
                if !previous.can_transition_to(next) {
                    return Err(OrderRecordError::IllegalTransition {
                        from: previous,
                        to: next,
                    });
                }
                if previous != next {
                    self.status = next;
                    self.history.push(next);
                }
                Ok(previous)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        let cart = CartSnapshot::new(vec![CartLine::new("latte-m", 1, Decimal::from(45_000))]);
        Order::from_create(OrderId(1), OrderDraft::from_cart(PaymentMethod::Cash, &cart)).unwrap()
    }

    #[test]
    fn test_status_moves_forward_only() {
        let mut order = order();
        assert_eq!(
            order.handle_action(OrderAction::SetStatus(OrderStatus::Processing)),
            Ok(OrderStatus::Pending)
        );
        assert_eq!(
            order.handle_action(OrderAction::SetStatus(OrderStatus::Pending)),
            Err(OrderRecordError::IllegalTransition {
                from: OrderStatus::Processing,
                to: OrderStatus::Pending
            })
        );
        order
            .handle_action(OrderAction::SetStatus(OrderStatus::Completed))
            .unwrap();
        assert_eq!(
            order.history,
            vec![OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Completed]
        );
    }

    #[test]
    fn test_terminal_states_are_exclusive() {
        let mut order = order();
        order
            .handle_action(OrderAction::SetStatus(OrderStatus::Cancelled))
            .unwrap();
        assert!(order
            .handle_action(OrderAction::SetStatus(OrderStatus::Completed))
            .is_err());
        // Re-applying the same terminal status is a no-op
        assert_eq!(
            order.handle_action(OrderAction::SetStatus(OrderStatus::Cancelled)),
            Ok(OrderStatus::Cancelled)
        );
        assert_eq!(order.history, vec![OrderStatus::Pending, OrderStatus::Cancelled]);
    }

    #[test]
    fn test_empty_draft_is_rejected() {
        let draft = OrderDraft::from_cart(PaymentMethod::Cash, &CartSnapshot::default());
        assert_eq!(
            Order::from_create(OrderId(1), draft),
            Err(OrderRecordError::EmptyOrder)
        );
    }
}
