//! # Mock Services
//!
//! Scriptable doubles for the external collaborators.
//!
//! - [`MockPaymentService`] reports `Pending` until a configured time has elapsed since the
//!   first query for an order, then `Paid`. Query and void failures can be injected, and
//!   every call is recorded.
//! - [`MockOrderService`] is a real [`InMemoryOrderService`] with failure injection in front
//!   of it.
//!
//! Time is read from `tokio::time`, so scripts behave deterministically under a paused
//! test clock.
//!
//! # Example
//! ```ignore
//! let payments = MockPaymentService::new().pays_after(Duration::from_secs(45));
//! // ... drive a checkout ...
//! assert_eq!(payments.voids().len(), 0);
//! ```

use crate::model::{
    GatewayRef, GatewayStatus, Order, OrderDraft, OrderId, OrderStatus, PaymentRecordRef,
    PaymentStatus,
};
use crate::services::{InMemoryOrderService, OrderService, PaymentQueryService, ServiceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// PAYMENT QUERY SERVICE
// =============================================================================

#[derive(Default)]
struct PaymentScript {
    paid_after: Option<Duration>,
    fail_queries_from: Option<usize>,
    unavailable: bool,
    without_redirect: bool,
    void_failures: usize,
    first_seen: HashMap<OrderId, Instant>,
    queries: Vec<OrderId>,
    voids: Vec<PaymentRecordRef>,
}

/// Scriptable [`PaymentQueryService`].
#[derive(Clone, Default)]
pub struct MockPaymentService {
    state: Arc<Mutex<PaymentScript>>,
}

impl MockPaymentService {
    /// A gateway that never reports payment and voids successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `Paid` once `after` has elapsed since the order's first query.
    pub fn pays_after(self, after: Duration) -> Self {
        self.state.lock().unwrap().paid_after = Some(after);
        self
    }

    /// Fail every query from the `n`-th one (1-based, counted per order).
    pub fn fails_queries_from(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_queries_from = Some(n);
        self
    }

    /// Fail every query.
    pub fn unavailable(self) -> Self {
        self.state.lock().unwrap().unavailable = true;
        self
    }

    /// Answer queries without a redirect handle.
    pub fn without_redirect(self) -> Self {
        self.state.lock().unwrap().without_redirect = true;
        self
    }

    /// Fail the next `times` void requests.
    pub fn fail_voids(&self, times: usize) {
        self.state.lock().unwrap().void_failures = times;
    }

    /// Number of status queries issued for `order_id`.
    pub fn query_count(&self, order_id: OrderId) -> usize {
        let state = self.state.lock().unwrap();
        state.queries.iter().filter(|id| **id == order_id).count()
    }

    pub fn total_queries(&self) -> usize {
        self.state.lock().unwrap().queries.len()
    }

    /// Every void request that succeeded, in order.
    pub fn voids(&self) -> Vec<PaymentRecordRef> {
        self.state.lock().unwrap().voids.clone()
    }

    pub fn redirect_for(order_id: OrderId) -> GatewayRef {
        GatewayRef(format!("https://pay.example.test/checkout/{}", order_id))
    }
}

#[async_trait]
impl PaymentQueryService for MockPaymentService {
    async fn get_status(&self, order_id: OrderId) -> Result<PaymentStatus, ServiceError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(order_id);
        let nth = state.queries.iter().filter(|id| **id == order_id).count();

        if state.unavailable || state.fail_queries_from.is_some_and(|from| nth >= from) {
            return Err(ServiceError::Unavailable(format!(
                "gateway timeout on query {} for {}",
                nth, order_id
            )));
        }

        let first_seen = *state.first_seen.entry(order_id).or_insert_with(Instant::now);
        let paid = state
            .paid_after
            .is_some_and(|after| first_seen.elapsed() >= after);

        Ok(PaymentStatus {
            gateway_status: if paid {
                GatewayStatus::Paid
            } else {
                GatewayStatus::Pending
            },
            gateway_ref: (!state.without_redirect).then(|| Self::redirect_for(order_id)),
        })
    }

    async fn void_payment(&self, payment: &PaymentRecordRef) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.void_failures > 0 {
            state.void_failures -= 1;
            return Err(ServiceError::Unavailable(format!(
                "void rejected for {}",
                payment.order_id
            )));
        }
        state.voids.push(payment.clone());
        Ok(())
    }
}

// =============================================================================
// ORDER SERVICE
// =============================================================================

#[derive(Default)]
struct OrderFaults {
    fail_create: bool,
    status_failures: HashMap<OrderStatus, usize>,
    status_calls: Vec<(OrderId, OrderStatus)>,
}

/// An in-memory order service with failure injection.
#[derive(Clone)]
pub struct MockOrderService {
    inner: InMemoryOrderService,
    faults: Arc<Mutex<OrderFaults>>,
    _handle: Arc<tokio::task::JoinHandle<()>>,
}

impl MockOrderService {
    /// Spawns the backing store actor. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (actor, inner) = InMemoryOrderService::spawnable(32);
        let handle = tokio::spawn(actor.run());
        Self {
            inner,
            faults: Arc::new(Mutex::new(OrderFaults::default())),
            _handle: Arc::new(handle),
        }
    }

    /// Reject every subsequent `create`.
    pub fn fail_create(&self) {
        self.faults.lock().unwrap().fail_create = true;
    }

    /// Reject the next `times` attempts to move an order to `status`.
    pub fn fail_status(&self, status: OrderStatus, times: usize) {
        self.faults
            .lock()
            .unwrap()
            .status_failures
            .insert(status, times);
    }

    /// Every `set_status` call that reached the store, in order.
    pub fn status_calls(&self) -> Vec<(OrderId, OrderStatus)> {
        self.faults.lock().unwrap().status_calls.clone()
    }

    pub async fn get(&self, order_id: OrderId) -> Option<Order> {
        self.inner.get(order_id).await.ok().flatten()
    }
}

#[async_trait]
impl OrderService for MockOrderService {
    async fn create(&self, draft: OrderDraft) -> Result<OrderId, ServiceError> {
        if self.faults.lock().unwrap().fail_create {
            return Err(ServiceError::Unavailable("order store offline".to_string()));
        }
        self.inner.create(draft).await
    }

    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(), ServiceError> {
        {
            let mut faults = self.faults.lock().unwrap();
            if let Some(remaining) = faults.status_failures.get_mut(&status) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ServiceError::Unavailable(format!(
                        "could not mark {} as {}",
                        order_id, status
                    )));
                }
            }
            faults.status_calls.push((order_id, status));
        }
        self.inner.set_status(order_id, status).await
    }
}
