//! Notifications the controller emits for the (out-of-scope) UI layer.
//!
//! Every terminal state and every non-fatal error is reported; there are no silent state
//! changes. Observers are called from controller and timer tasks and must not block.

use crate::error::ErrorKind;
use crate::model::{GatewayRef, OrderId};
use std::fmt::Display;
use tokio::sync::mpsc;

/// Why an order was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    Operator,
    SwitchMethod,
    Timeout,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::Operator => "operator",
            CancelReason::SwitchMethod => "switch_method",
            CancelReason::Timeout => "timeout",
        }
    }
}

impl Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait LifecycleObserver: Send + Sync {
    /// Countdown tick while the order awaits resolution.
    fn on_awaiting_payment(&self, order_id: OrderId, remaining_secs: u64);

    /// A gateway produced a redirect handle for the operator to open.
    fn on_redirect(&self, _order_id: OrderId, _handle: &GatewayRef) {}

    fn on_completed(&self, order_id: OrderId);

    fn on_cancelled(&self, order_id: OrderId, reason: CancelReason);

    /// `order_id` is `None` for failures that happen before an order exists.
    fn on_error(&self, order_id: Option<OrderId>, kind: ErrorKind, detail: &str);
}

/// Observer events as plain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    AwaitingPayment {
        order_id: OrderId,
        remaining_secs: u64,
    },
    RedirectReady {
        order_id: OrderId,
        handle: GatewayRef,
    },
    Completed {
        order_id: OrderId,
    },
    Cancelled {
        order_id: OrderId,
        reason: CancelReason,
    },
    Error {
        order_id: Option<OrderId>,
        kind: ErrorKind,
        detail: String,
    },
}

impl LifecycleEvent {
    pub fn is_tick(&self) -> bool {
        matches!(self, LifecycleEvent::AwaitingPayment { .. })
    }
}

/// Forwards every notification into an unbounded channel.
#[derive(Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn emit(&self, event: LifecycleEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

impl LifecycleObserver for ChannelObserver {
    fn on_awaiting_payment(&self, order_id: OrderId, remaining_secs: u64) {
        self.emit(LifecycleEvent::AwaitingPayment {
            order_id,
            remaining_secs,
        });
    }

    fn on_redirect(&self, order_id: OrderId, handle: &GatewayRef) {
        self.emit(LifecycleEvent::RedirectReady {
            order_id,
            handle: handle.clone(),
        });
    }

    fn on_completed(&self, order_id: OrderId) {
        self.emit(LifecycleEvent::Completed { order_id });
    }

    fn on_cancelled(&self, order_id: OrderId, reason: CancelReason) {
        self.emit(LifecycleEvent::Cancelled { order_id, reason });
    }

    fn on_error(&self, order_id: Option<OrderId>, kind: ErrorKind, detail: &str) {
        self.emit(LifecycleEvent::Error {
            order_id,
            kind,
            detail: detail.to_string(),
        });
    }
}
