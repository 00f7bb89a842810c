use crate::error::CheckoutError;
use crate::lifecycle::message::{CheckoutRequest, CheckoutTicket, OrderView, Resolution, Response};
use crate::model::{CartSnapshot, OrderId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// Operator-facing handle to the [`OrderLifecycleController`](crate::lifecycle::OrderLifecycleController).
///
/// Cloneable. The controller shuts down once every clone is dropped.
#[derive(Clone)]
pub struct CheckoutClient {
    sender: mpsc::Sender<CheckoutRequest>,
}

impl CheckoutClient {
    pub fn new(sender: mpsc::Sender<CheckoutRequest>) -> Self {
        Self { sender }
    }

    /// Creates an order for `cart` and starts settling it with `method_id`.
    ///
    /// An unresolved order from an earlier checkout is cancelled first, as if the operator
    /// had switched method.
    #[instrument(skip(self, cart), fields(lines = cart.lines().len()))]
    pub async fn checkout(
        &self,
        method_id: &str,
        cart: CartSnapshot,
    ) -> Result<CheckoutTicket, CheckoutError> {
        debug!(?cart, "checkout called");
        self.request(|respond_to| CheckoutRequest::Checkout {
            method_id: method_id.to_string(),
            cart,
            respond_to,
        })
        .await
    }

    /// Operator confirms cash was received.
    #[instrument(skip(self))]
    pub async fn confirm_cash(&self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::ConfirmCash {
            order_id,
            respond_to,
        })
        .await
    }

    /// Cancels the order and voids its payment. Retry after a `PaymentVoidFailed`.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::Cancel {
            order_id,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn switch_method(&self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        self.request(|respond_to| CheckoutRequest::SwitchMethod {
            order_id,
            respond_to,
        })
        .await
    }

    /// The order currently being settled, if any.
    pub async fn snapshot(&self) -> Result<Option<OrderView>, CheckoutError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CheckoutRequest::Snapshot { respond_to })
            .await
            .map_err(|_| CheckoutError::ControllerClosed)?;
        response.await.map_err(|_| CheckoutError::ControllerDropped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> CheckoutRequest,
    ) -> Result<T, CheckoutError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CheckoutError::ControllerClosed)?;
        response.await.map_err(|_| CheckoutError::ControllerDropped)?
    }
}
