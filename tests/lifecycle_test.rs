//! Lifecycle scenarios on a paused clock.
//!
//! Every test drives a real controller against the scripted services. Time only moves when
//! every task is idle, so timestamps below are exact.

use pos_checkout::config::CheckoutConfig;
use pos_checkout::error::{CheckoutError, ErrorKind};
use pos_checkout::lifecycle::{
    CancelReason, ChannelObserver, CheckoutClient, LifecycleEvent, OrderLifecycleController,
    OrderPhase, Resolution,
};
use pos_checkout::model::{
    CartLine, CartSnapshot, GatewayProvider, OrderId, OrderStatus, PaymentMethod,
};
use pos_checkout::services::mock::{MockOrderService, MockPaymentService};
use pos_checkout::settlement::StrategyRegistry;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, Instant};

struct Harness {
    client: CheckoutClient,
    orders: MockOrderService,
    payments: MockPaymentService,
    events: UnboundedReceiver<LifecycleEvent>,
}

impl Harness {
    fn start(payments: MockPaymentService) -> Self {
        Self::with_config(CheckoutConfig::default(), payments)
    }

    fn with_config(config: CheckoutConfig, payments: MockPaymentService) -> Self {
        let orders = MockOrderService::new();
        let (observer, events) = ChannelObserver::new();
        let registry = StrategyRegistry::new(&config.methods, Arc::new(payments.clone()));
        let (controller, client) = OrderLifecycleController::new(
            &config,
            registry,
            Arc::new(orders.clone()),
            Arc::new(payments.clone()),
            Arc::new(observer),
        );
        tokio::spawn(controller.run());
        Self {
            client,
            orders,
            payments,
            events,
        }
    }

    /// Next event that is not a countdown tick.
    async fn next_event(&mut self) -> LifecycleEvent {
        loop {
            let event = self.events.recv().await.expect("observer channel closed");
            if !event.is_tick() {
                return event;
            }
        }
    }

    /// Every non-tick event delivered so far.
    fn drain(&mut self) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if !event.is_tick() {
                events.push(event);
            }
        }
        events
    }

    async fn history(&self, order_id: OrderId) -> Vec<OrderStatus> {
        self.orders.get(order_id).await.expect("order exists").history
    }
}

fn cart() -> CartSnapshot {
    CartSnapshot::new(vec![CartLine::new("espresso", 3, Decimal::from(50_000))])
}

fn is_terminal(event: &LifecycleEvent) -> bool {
    matches!(
        event,
        LifecycleEvent::Completed { .. } | LifecycleEvent::Cancelled { .. }
    )
}

// =============================================================================
// HAPPY PATHS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_cash_order_confirmed_by_operator() {
    let mut h = Harness::start(MockPaymentService::new());

    let ticket = h.client.checkout("cash", cart()).await.unwrap();
    assert_eq!(ticket.method, PaymentMethod::Cash);
    assert_eq!(ticket.total_due, Decimal::from(150_000));
    assert_eq!(ticket.redirect, None);

    sleep(Duration::from_secs(10)).await;
    let resolution = h.client.confirm_cash(ticket.order_id).await.unwrap();
    assert_eq!(resolution, Resolution::Completed);
    assert_eq!(
        h.next_event().await,
        LifecycleEvent::Completed {
            order_id: ticket.order_id
        }
    );
    assert_eq!(
        h.history(ticket.order_id).await,
        vec![OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Completed]
    );

    // Cash never polls, and the deadline is inert after completion
    sleep(Duration::from_secs(400)).await;
    assert_eq!(h.payments.total_queries(), 0);
    assert!(h.payments.voids().is_empty());
    assert!(h.drain().is_empty());
    assert_eq!(h.client.snapshot().await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_payment_observed_by_poller() {
    let started = Instant::now();
    let mut h = Harness::start(MockPaymentService::new().pays_after(Duration::from_secs(45)));

    let ticket = h.client.checkout("momo", cart()).await.unwrap();
    let order_id = ticket.order_id;
    let handle = MockPaymentService::redirect_for(order_id);
    assert_eq!(ticket.redirect, Some(handle.clone()));
    assert_eq!(
        h.next_event().await,
        LifecycleEvent::RedirectReady { order_id, handle }
    );

    assert_eq!(h.next_event().await, LifecycleEvent::Completed { order_id });
    assert_eq!(started.elapsed(), Duration::from_secs(45));

    // One query from initiation, then one every 3s up to 45s
    let queries = h.payments.query_count(order_id);
    assert_eq!(queries, 16);

    sleep(Duration::from_secs(300)).await;
    assert_eq!(h.payments.query_count(order_id), queries);
    assert!(h.payments.voids().is_empty());
    assert!(h.drain().is_empty());
    assert_eq!(
        h.history(order_id).await,
        vec![OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Completed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_every_second() {
    let mut h = Harness::start(MockPaymentService::new());
    h.client.checkout("cash", cart()).await.unwrap();

    let mut remaining = Vec::new();
    while remaining.len() < 3 {
        if let Some(LifecycleEvent::AwaitingPayment { remaining_secs, .. }) = h.events.recv().await {
            remaining.push(remaining_secs);
        }
    }
    assert_eq!(remaining, vec![300, 299, 298]);

    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.phase, OrderPhase::AwaitingPayment);
    assert_eq!(view.remaining_secs, 298);
    assert!(!view.polling);
}

// =============================================================================
// DEADLINE & SWITCHING
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_and_voids_once() {
    let started = Instant::now();
    let mut h = Harness::start(MockPaymentService::new());

    let ticket = h.client.checkout("vnpay", cart()).await.unwrap();
    let order_id = ticket.order_id;
    assert!(matches!(h.next_event().await, LifecycleEvent::RedirectReady { .. }));

    assert_eq!(
        h.next_event().await,
        LifecycleEvent::Cancelled {
            order_id,
            reason: CancelReason::Timeout
        }
    );
    assert_eq!(started.elapsed(), Duration::from_secs(300));

    let voids = h.payments.voids();
    assert_eq!(voids.len(), 1);
    assert_eq!(voids[0].order_id, order_id);
    assert_eq!(voids[0].method, PaymentMethod::Gateway(GatewayProvider::VnPay));
    assert_eq!(voids[0].gateway_ref, ticket.redirect);

    let queries = h.payments.query_count(order_id);
    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.payments.query_count(order_id), queries);
    assert_eq!(
        h.history(order_id).await,
        vec![OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Cancelled]
    );
}

#[tokio::test(start_paused = true)]
async fn test_switch_method_stops_old_order_before_new_one() {
    let mut h = Harness::start(MockPaymentService::new());

    let first = h.client.checkout("momo", cart()).await.unwrap().order_id;
    sleep(Duration::from_secs(20)).await;

    let resolution = h.client.switch_method(first).await.unwrap();
    assert_eq!(resolution, Resolution::Cancelled(CancelReason::SwitchMethod));
    let events = h.drain();
    assert_eq!(
        events.last(),
        Some(&LifecycleEvent::Cancelled {
            order_id: first,
            reason: CancelReason::SwitchMethod
        })
    );
    assert_eq!(h.client.snapshot().await.unwrap(), None);
    let old_queries = h.payments.query_count(first);

    let second = h.client.checkout("cash", cart()).await.unwrap().order_id;
    assert_ne!(first, second);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(h.payments.query_count(first), old_queries);
    assert_eq!(h.payments.total_queries(), old_queries);
    assert_eq!(h.payments.voids().len(), 1);
    assert_eq!(h.orders.get(first).await.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(h.orders.get(second).await.unwrap().status, OrderStatus::Processing);
}

#[tokio::test(start_paused = true)]
async fn test_checkout_retires_unresolved_order() {
    let mut h = Harness::start(MockPaymentService::new());

    let first = h.client.checkout("momo", cart()).await.unwrap().order_id;
    let second = h.client.checkout("vnpay", cart()).await.unwrap().order_id;

    let cancelled: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(
        cancelled,
        vec![LifecycleEvent::Cancelled {
            order_id: first,
            reason: CancelReason::SwitchMethod
        }]
    );
    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.order_id, second);
    assert!(view.polling);
}

// =============================================================================
// RACES
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_confirmation_after_deadline_is_a_no_op() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;

    sleep(Duration::from_secs(301)).await;
    let resolution = h.client.confirm_cash(order_id).await.unwrap();
    assert_eq!(resolution, Resolution::AlreadyResolved);

    let terminal: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(
        terminal,
        vec![LifecycleEvent::Cancelled {
            order_id,
            reason: CancelReason::Timeout
        }]
    );
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_completion_is_a_no_op() {
    let mut h = Harness::start(MockPaymentService::new().pays_after(Duration::from_secs(6)));
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;

    assert!(matches!(h.next_event().await, LifecycleEvent::RedirectReady { .. }));
    assert_eq!(h.next_event().await, LifecycleEvent::Completed { order_id });

    assert_eq!(h.client.cancel(order_id).await.unwrap(), Resolution::AlreadyResolved);
    assert!(h.payments.voids().is_empty());
    assert!(h.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_operator_and_poller_racing_resolve_once() {
    let mut h = Harness::start(MockPaymentService::new().pays_after(Duration::from_secs(30)));
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;

    // Lands on the same instant as the paying poll
    sleep(Duration::from_secs(30)).await;
    let resolution = h.client.cancel(order_id).await.unwrap();

    sleep(Duration::from_secs(400)).await;
    let terminal: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(terminal.len(), 1);

    let order = h.orders.get(order_id).await.unwrap();
    let terminal_statuses = order.history.iter().filter(|s| s.is_terminal()).count();
    assert_eq!(terminal_statuses, 1);
    match resolution {
        Resolution::Cancelled(CancelReason::Operator) => {
            assert_eq!(order.status, OrderStatus::Cancelled);
            assert_eq!(h.payments.voids().len(), 1);
        }
        Resolution::AlreadyResolved => {
            assert_eq!(order.status, OrderStatus::Completed);
            assert!(h.payments.voids().is_empty());
        }
        other => panic!("unexpected resolution {:?}", other),
    }
}

// =============================================================================
// PARTIAL FAILURES
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_void_leaves_cancel_pending() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;
    h.payments.fail_voids(1);

    let err = h.client.cancel(order_id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentVoidFailed(_)));
    assert!(err.is_retryable());
    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { order_id: Some(id), kind: ErrorKind::PaymentVoidFailed, .. } if id == order_id
    ));

    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.phase, OrderPhase::CancelPendingVoid);

    // A half-cancelled order can never complete
    assert_eq!(
        h.client.confirm_cash(order_id).await.unwrap(),
        Resolution::AlreadyResolved
    );

    assert_eq!(
        h.client.cancel(order_id).await.unwrap(),
        Resolution::Cancelled(CancelReason::Operator)
    );
    assert_eq!(
        h.next_event().await,
        LifecycleEvent::Cancelled {
            order_id,
            reason: CancelReason::Operator
        }
    );

    // The order record was cancelled exactly once
    let cancels = h
        .orders
        .status_calls()
        .into_iter()
        .filter(|call| *call == (order_id, OrderStatus::Cancelled))
        .count();
    assert_eq!(cancels, 1);
    assert_eq!(h.payments.voids().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_checkout_retries_pending_void_first() {
    let mut h = Harness::start(MockPaymentService::new());
    let first = h.client.checkout("cash", cart()).await.unwrap().order_id;
    h.payments.fail_voids(2);

    assert!(h.client.cancel(first).await.is_err());

    // Void still failing: nothing new is created
    let err = h.client.checkout("momo", cart()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentVoidFailed(_)));
    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.order_id, first);
    assert_eq!(view.phase, OrderPhase::CancelPendingVoid);

    let second = h.client.checkout("momo", cart()).await.unwrap().order_id;
    assert_ne!(first, second);
    let terminal: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(
        terminal,
        vec![LifecycleEvent::Cancelled {
            order_id: first,
            reason: CancelReason::Operator
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_cancel_update_keeps_order_running() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;
    h.orders.fail_status(OrderStatus::Cancelled, 1);

    let err = h.client.cancel(order_id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderUpdateFailed(_)));
    assert!(h.payments.voids().is_empty());
    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.phase, OrderPhase::AwaitingPayment);

    // Claim was released: confirmation still possible
    assert_eq!(
        h.client.confirm_cash(order_id).await.unwrap(),
        Resolution::Completed
    );
    let terminal: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(terminal, vec![LifecycleEvent::Completed { order_id }]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_completion_update_is_observed_again() {
    let started = Instant::now();
    let mut h = Harness::start(MockPaymentService::new().pays_after(Duration::from_secs(6)));
    h.orders.fail_status(OrderStatus::Completed, 1);
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;

    assert!(matches!(h.next_event().await, LifecycleEvent::RedirectReady { .. }));
    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { kind: ErrorKind::OrderUpdateFailed, .. }
    ));
    assert_eq!(h.next_event().await, LifecycleEvent::Completed { order_id });
    // Paid at 6s, restarted poller sees it again one interval later
    assert_eq!(started.elapsed(), Duration::from_secs(9));
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_failed_timeout_cancel_retries_until_cancelled() {
    let started = Instant::now();
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;
    h.orders.fail_status(OrderStatus::Cancelled, 1);

    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { order_id: Some(id), kind: ErrorKind::OrderUpdateFailed, .. } if id == order_id
    ));
    assert_eq!(started.elapsed(), Duration::from_secs(300));

    // Re-fired one tick later
    assert_eq!(
        h.next_event().await,
        LifecycleEvent::Cancelled {
            order_id,
            reason: CancelReason::Timeout
        }
    );
    assert_eq!(started.elapsed(), Duration::from_secs(301));
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Cancelled);
    assert_eq!(h.payments.voids().len(), 1);
    assert_eq!(h.client.snapshot().await.unwrap(), None);

    sleep(Duration::from_secs(60)).await;
    assert!(h.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_during_deadline_retry_wins() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;
    h.orders.fail_status(OrderStatus::Cancelled, 1);

    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { kind: ErrorKind::OrderUpdateFailed, .. }
    ));
    assert_eq!(
        h.client.confirm_cash(order_id).await.unwrap(),
        Resolution::Completed
    );

    sleep(Duration::from_secs(10)).await;
    let terminal: Vec<_> = h.drain().into_iter().filter(is_terminal).collect();
    assert_eq!(terminal, vec![LifecycleEvent::Completed { order_id }]);
    assert!(h.payments.voids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_is_reported_not_fatal() {
    let mut h = Harness::start(MockPaymentService::new().fails_queries_from(3));
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;

    assert!(matches!(h.next_event().await, LifecycleEvent::RedirectReady { .. }));
    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { order_id: Some(id), kind: ErrorKind::PollError, .. } if id == order_id
    ));

    let view = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(view.phase, OrderPhase::AwaitingPayment);
    assert!(!view.polling);
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Processing);

    // The deadline is the backstop
    assert_eq!(
        h.next_event().await,
        LifecycleEvent::Cancelled {
            order_id,
            reason: CancelReason::Timeout
        }
    );
    assert_eq!(h.payments.query_count(order_id), 3);
}

// =============================================================================
// REJECTED CHECKOUTS
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_and_disabled_methods_are_rejected() {
    let config = CheckoutConfig {
        methods: vec![PaymentMethod::Cash],
        ..CheckoutConfig::default()
    };
    let mut h = Harness::with_config(config, MockPaymentService::new());

    for method in ["bitcoin", "momo"] {
        let err = h.client.checkout(method, cart()).await.unwrap_err();
        assert_eq!(err, CheckoutError::UnsupportedMethod(method.to_string()));
        assert!(matches!(
            h.next_event().await,
            LifecycleEvent::Error { order_id: None, kind: ErrorKind::UnsupportedMethod, .. }
        ));
    }
    assert!(h.orders.get(OrderId(1)).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_creation_failures_start_nothing() {
    let mut h = Harness::start(MockPaymentService::new());

    let err = h.client.checkout("cash", CartSnapshot::default()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreationFailed(_)));

    h.orders.fail_create();
    let err = h.client.checkout("cash", cart()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreationFailed(_)));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.client.snapshot().await.unwrap(), None);
    let events = h.drain();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(
        e,
        LifecycleEvent::Error { kind: ErrorKind::OrderCreationFailed, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_gateway_abandons_order() {
    let mut h = Harness::start(MockPaymentService::new().unavailable());

    let err = h.client.checkout("momo", cart()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::GatewayUnavailable(_)));
    assert_eq!(h.client.snapshot().await.unwrap(), None);

    let order_id = OrderId(1);
    assert_eq!(
        h.history(order_id).await,
        vec![OrderStatus::Pending, OrderStatus::Cancelled]
    );
    assert_eq!(h.client.cancel(order_id).await.unwrap(), Resolution::AlreadyResolved);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.payments.total_queries(), 1);
    assert!(matches!(
        h.next_event().await,
        LifecycleEvent::Error { order_id: Some(_), kind: ErrorKind::GatewayUnavailable, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_empty_cart_keeps_active_order() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;
    let before = h.client.snapshot().await.unwrap().unwrap();

    let err = h
        .client
        .checkout("cash", CartSnapshot::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreationFailed(_)));

    let after = h.client.snapshot().await.unwrap().unwrap();
    assert_eq!(after.order_id, order_id);
    assert_eq!(after.phase, OrderPhase::AwaitingPayment);
    assert!(after.polling);
    assert_eq!(after.redirect, before.redirect);
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Processing);
    assert!(h.payments.voids().is_empty());
    assert!(!h.drain().iter().any(is_terminal));
}

#[tokio::test(start_paused = true)]
async fn test_failed_processing_update_voids_gateway_payment() {
    let mut h = Harness::start(MockPaymentService::new());
    h.orders.fail_status(OrderStatus::Processing, 1);

    let err = h.client.checkout("momo", cart()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderUpdateFailed(_)));

    let order_id = OrderId(1);
    assert_eq!(
        h.history(order_id).await,
        vec![OrderStatus::Pending, OrderStatus::Cancelled]
    );
    let voids = h.payments.voids();
    assert_eq!(voids.len(), 1);
    assert_eq!(voids[0].order_id, order_id);
    assert_eq!(
        voids[0].gateway_ref,
        Some(MockPaymentService::redirect_for(order_id))
    );
    assert_eq!(h.client.snapshot().await.unwrap(), None);
    assert_eq!(h.client.cancel(order_id).await.unwrap(), Resolution::AlreadyResolved);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.payments.total_queries(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abandon_failure_is_reported_and_not_resolved() {
    let mut h = Harness::start(MockPaymentService::new());
    h.orders.fail_status(OrderStatus::Processing, 1);
    h.orders.fail_status(OrderStatus::Cancelled, 1);

    let err = h.client.checkout("cash", cart()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderUpdateFailed(_)));

    let order_id = OrderId(1);
    let errors: Vec<_> = h
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            LifecycleEvent::Error { order_id, kind, .. } => Some((order_id, kind)),
            _ => None,
        })
        .collect();
    assert_eq!(
        errors,
        vec![
            (Some(order_id), ErrorKind::OrderUpdateFailed),
            (Some(order_id), ErrorKind::OrderUpdateFailed),
        ]
    );
    assert_eq!(h.orders.get(order_id).await.unwrap().status, OrderStatus::Pending);

    // Not reported as already resolved
    let err = h.client.confirm_cash(order_id).await.unwrap_err();
    assert_eq!(err, CheckoutError::UnknownOrder(order_id));
}

#[tokio::test(start_paused = true)]
async fn test_resolved_history_is_bounded() {
    let config = CheckoutConfig {
        resolved_history: 2,
        ..CheckoutConfig::default()
    };
    let h = Harness::with_config(config, MockPaymentService::new());

    let mut ids = Vec::new();
    for _ in 0..3 {
        let order_id = h.client.checkout("cash", cart()).await.unwrap().order_id;
        assert_eq!(
            h.client.confirm_cash(order_id).await.unwrap(),
            Resolution::Completed
        );
        ids.push(order_id);
    }

    let err = h.client.confirm_cash(ids[0]).await.unwrap_err();
    assert_eq!(err, CheckoutError::UnknownOrder(ids[0]));
    for order_id in &ids[1..] {
        assert_eq!(
            h.client.confirm_cash(*order_id).await.unwrap(),
            Resolution::AlreadyResolved
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_operator_commands_validate_the_order() {
    let mut h = Harness::start(MockPaymentService::new());
    let order_id = h.client.checkout("momo", cart()).await.unwrap().order_id;

    let err = h.client.confirm_cash(order_id).await.unwrap_err();
    assert_eq!(err, CheckoutError::NotCashOrder(order_id));

    let err = h.client.cancel(OrderId(99)).await.unwrap_err();
    assert_eq!(err, CheckoutError::UnknownOrder(OrderId(99)));

    let kinds: Vec<_> = h
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            LifecycleEvent::Error { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![ErrorKind::NotCashOrder, ErrorKind::UnknownOrder]);
}
