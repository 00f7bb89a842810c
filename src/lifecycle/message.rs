//! Requests accepted by the [`OrderLifecycleController`](crate::lifecycle::OrderLifecycleController),
//! and the values it answers with.

use crate::error::CheckoutError;
use crate::lifecycle::CancelReason;
use crate::model::{CartSnapshot, GatewayRef, OrderId, PaymentMethod};
use rust_decimal::Decimal;
use tokio::sync::oneshot;

/// One-shot response channel used by the controller.
pub type Response<T> = oneshot::Sender<Result<T, CheckoutError>>;

/// Operator commands.
#[derive(Debug)]
pub enum CheckoutRequest {
    Checkout {
        method_id: String,
        cart: CartSnapshot,
        respond_to: Response<CheckoutTicket>,
    },
    ConfirmCash {
        order_id: OrderId,
        respond_to: Response<Resolution>,
    },
    Cancel {
        order_id: OrderId,
        respond_to: Response<Resolution>,
    },
    SwitchMethod {
        order_id: OrderId,
        respond_to: Response<Resolution>,
    },
    Snapshot {
        respond_to: oneshot::Sender<Option<OrderView>>,
    },
}

/// Signals raised by the controller's own background tasks.
#[derive(Debug)]
pub(crate) enum Signal {
    PaymentObserved { order_id: OrderId },
    PollFailed { order_id: OrderId, detail: String },
    DeadlineExpired { order_id: OrderId },
}

/// Handed back once an order is created and settlement has started.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTicket {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    /// Redirect handle for gateway methods.
    pub redirect: Option<GatewayRef>,
    pub total_due: Decimal,
}

/// Outcome of a resolving command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Cancelled(CancelReason),
    /// Another signal source resolved the order first. Nothing changed.
    AlreadyResolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPhase {
    /// Processing; waiting for the poller, the operator or the deadline.
    AwaitingPayment,
    /// The order is cancelled but its payment record is not voided yet.
    CancelPendingVoid,
}

/// Read-only view of the active order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderView {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub phase: OrderPhase,
    pub remaining_secs: u64,
    pub redirect: Option<GatewayRef>,
    /// Whether a status poller is currently running for the order.
    pub polling: bool,
}
