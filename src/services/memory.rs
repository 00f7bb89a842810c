//! # In-Memory Order Service
//!
//! An [`OrderService`] backed by a [`RecordActor<Order>`](crate::store::RecordActor).
//! The order record enforces monotonic status transitions, so an illegal transition
//! surfaces here as [`ServiceError::Rejected`].

use crate::model::{Order, OrderAction, OrderDraft, OrderId, OrderStatus};
use crate::services::{OrderService, ServiceError};
use crate::store::{RecordActor, RecordClient, StoreError};
use async_trait::async_trait;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct InMemoryOrderService {
    inner: RecordClient<Order>,
}

impl InMemoryOrderService {
    pub fn new(inner: RecordClient<Order>) -> Self {
        Self { inner }
    }

    /// Creates the backing store actor and a service bound to it.
    ///
    /// The actor must be spawned with `tokio::spawn(actor.run())`.
    pub fn spawnable(buffer_size: usize) -> (RecordActor<Order>, Self) {
        let (actor, client) = RecordActor::new(buffer_size);
        (actor, Self::new(client))
    }

    /// Fetch an order record, mainly for inspection by operators and tests.
    #[instrument(skip(self))]
    pub async fn get(&self, order_id: OrderId) -> Result<Option<Order>, ServiceError> {
        self.inner.get(order_id).await.map_err(map_store_error)
    }
}

fn map_store_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::ActorClosed | StoreError::ActorDropped => ServiceError::Unavailable(e.to_string()),
        StoreError::NotFound(id) => ServiceError::NotFound(id),
        StoreError::Rejected(inner) => ServiceError::Rejected(inner.to_string()),
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    #[instrument(skip(self, draft), fields(method = %draft.method))]
    async fn create(&self, draft: OrderDraft) -> Result<OrderId, ServiceError> {
        debug!(?draft, "create called");
        self.inner.create(draft).await.map_err(map_store_error)
    }

    #[instrument(skip(self))]
    async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(), ServiceError> {
        debug!("Sending request");
        self.inner
            .perform_action(order_id, OrderAction::SetStatus(status))
            .await
            .map(|_previous| ())
            .map_err(map_store_error)
    }
}
