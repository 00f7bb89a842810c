//! Error types for the checkout flow.

use crate::model::OrderId;
use std::fmt::Display;
use thiserror::Error;

/// Errors surfaced by the lifecycle controller and the settlement strategies.
///
/// "Already resolved" is deliberately absent: a signal arriving after resolution is a
/// no-op, reported as [`Resolution::AlreadyResolved`](crate::lifecycle::Resolution).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    /// The method identifier is unknown, or known but not enabled on this terminal.
    #[error("Unsupported payment method: {0}")]
    UnsupportedMethod(String),

    /// The order service could not create the order. Nothing was started.
    #[error("Order creation failed: {0}")]
    OrderCreationFailed(String),

    /// The gateway could not produce payment details for the order.
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// A background status query failed. The order is left to the deadline or the operator.
    #[error("Payment status query failed: {0}")]
    PollError(String),

    /// The order service refused or failed a status change. Retryable.
    #[error("Order update failed: {0}")]
    OrderUpdateFailed(String),

    /// The payment record could not be voided. Retryable by cancelling again.
    #[error("Payment void failed: {0}")]
    PaymentVoidFailed(String),

    /// The order is not (or no longer) tracked by this session.
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Cash confirmation was requested for an order settled by another method.
    #[error("Order {0} is not a cash order")]
    NotCashOrder(OrderId),

    #[error("Controller closed")]
    ControllerClosed,

    #[error("Controller dropped response channel")]
    ControllerDropped,
}

/// Discriminant of [`CheckoutError`], as delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedMethod,
    OrderCreationFailed,
    GatewayUnavailable,
    PollError,
    OrderUpdateFailed,
    PaymentVoidFailed,
    UnknownOrder,
    NotCashOrder,
    ControllerUnavailable,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::UnsupportedMethod => "unsupported_method",
            ErrorKind::OrderCreationFailed => "order_creation_failed",
            ErrorKind::GatewayUnavailable => "gateway_unavailable",
            ErrorKind::PollError => "poll_error",
            ErrorKind::OrderUpdateFailed => "order_update_failed",
            ErrorKind::PaymentVoidFailed => "payment_void_failed",
            ErrorKind::UnknownOrder => "unknown_order",
            ErrorKind::NotCashOrder => "not_cash_order",
            ErrorKind::ControllerUnavailable => "controller_unavailable",
        };
        f.write_str(s)
    }
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::UnsupportedMethod(_) => ErrorKind::UnsupportedMethod,
            CheckoutError::OrderCreationFailed(_) => ErrorKind::OrderCreationFailed,
            CheckoutError::GatewayUnavailable(_) => ErrorKind::GatewayUnavailable,
            CheckoutError::PollError(_) => ErrorKind::PollError,
            CheckoutError::OrderUpdateFailed(_) => ErrorKind::OrderUpdateFailed,
            CheckoutError::PaymentVoidFailed(_) => ErrorKind::PaymentVoidFailed,
            CheckoutError::UnknownOrder(_) => ErrorKind::UnknownOrder,
            CheckoutError::NotCashOrder(_) => ErrorKind::NotCashOrder,
            CheckoutError::ControllerClosed | CheckoutError::ControllerDropped => {
                ErrorKind::ControllerUnavailable
            }
        }
    }

    /// Whether the operator can usefully retry the same command.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::OrderUpdateFailed(_) | CheckoutError::PaymentVoidFailed(_)
        )
    }

    /// Human-readable detail without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            CheckoutError::UnsupportedMethod(d)
            | CheckoutError::OrderCreationFailed(d)
            | CheckoutError::GatewayUnavailable(d)
            | CheckoutError::PollError(d)
            | CheckoutError::OrderUpdateFailed(d)
            | CheckoutError::PaymentVoidFailed(d) => d.clone(),
            other => other.to_string(),
        }
    }
}
