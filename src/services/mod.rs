//! Contracts of the external collaborators the checkout flow consumes.
//!
//! The lifecycle controller only ever talks to an order store and a payment query service
//! through these traits. [`memory`] provides an in-process order service for the demo and
//! integration tests; [`mock`] provides scriptable doubles for timing-sensitive tests.

pub mod memory;
pub mod mock;

pub use memory::InMemoryOrderService;

use crate::model::{OrderDraft, OrderId, OrderStatus, PaymentRecordRef, PaymentStatus};
use async_trait::async_trait;

/// Failure reported by an external collaborator.
///
/// The controller maps these onto its own taxonomy depending on which call failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Owns order records. Creates them and moves their status.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create(&self, draft: OrderDraft) -> Result<OrderId, ServiceError>;

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(), ServiceError>;
}

/// Reports and voids the payment record attached to an order.
#[async_trait]
pub trait PaymentQueryService: Send + Sync {
    async fn get_status(&self, order_id: OrderId) -> Result<PaymentStatus, ServiceError>;

    async fn void_payment(&self, payment: &PaymentRecordRef) -> Result<(), ServiceError>;
}
