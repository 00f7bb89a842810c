//! # Order Lifecycle Controller
//!
//! The controller is an actor: one task owns the active order and handles operator
//! commands and background signals one at a time. Background work never touches the order
//! directly. The countdown and the poller only *send signals* back to the controller:
//!
//! ```text
//!   CheckoutClient ──commands──────▶ ┌──────────────────────────┐ ──▶ OrderService
//!                                    │ OrderLifecycleController │ ──▶ PaymentQueryService
//!   countdown ──DeadlineExpired────▶ │   active: ActiveOrder    │ ──▶ LifecycleObserver
//!   poller ──PaymentObserved───────▶ └──────────────────────────┘
//! ```
//!
//! Each active order carries a [`ResolutionGuard`]; every path that resolves it claims
//! the guard first. A new checkout always tears down the previous order's tasks (through
//! its [`CancellationToken`]) before anything new is started.

use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::lifecycle::guard::{Claim, Intent, ResolutionGuard};
use crate::lifecycle::message::{
    CheckoutRequest, CheckoutTicket, OrderPhase, OrderView, Resolution, Signal,
};
use crate::lifecycle::{CancelReason, CheckoutClient, LifecycleObserver};
use crate::model::{
    CartSnapshot, GatewayRef, OrderDraft, OrderId, OrderStatus, PaymentMethod, PaymentRecordRef,
};
use crate::poller::{PaymentStatusPoller, PollOutcome, PollerHandle};
use crate::services::{OrderService, PaymentQueryService};
use crate::settlement::StrategyRegistry;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// The order currently being settled, and everything bound to it.
struct ActiveOrder {
    order_id: OrderId,
    method: PaymentMethod,
    polled: bool,
    redirect: Option<GatewayRef>,
    guard: Arc<ResolutionGuard>,
    /// Parent of the countdown and poller tokens.
    token: CancellationToken,
    poller: Option<PollerHandle>,
    deadline: Instant,
    /// Set once the order record is Cancelled; only the payment void is left.
    order_cancelled: bool,
    cancel_reason: Option<CancelReason>,
}

pub struct OrderLifecycleController {
    receiver: mpsc::Receiver<CheckoutRequest>,
    signals: mpsc::UnboundedReceiver<Signal>,
    signal_tx: mpsc::UnboundedSender<Signal>,
    registry: StrategyRegistry,
    orders: Arc<dyn OrderService>,
    payments: Arc<dyn PaymentQueryService>,
    poller: PaymentStatusPoller,
    observer: Arc<dyn LifecycleObserver>,
    deadline: Duration,
    tick: Duration,
    root: CancellationToken,
    active: Option<ActiveOrder>,
    /// Recently resolved orders, oldest first. Bounded by `resolved_history`.
    resolved: HashSet<OrderId>,
    resolved_order: VecDeque<OrderId>,
    resolved_history: usize,
}

impl OrderLifecycleController {
    /// Creates the controller and a client bound to it. Spawn with `tokio::spawn(controller.run())`.
    pub fn new(
        config: &CheckoutConfig,
        registry: StrategyRegistry,
        orders: Arc<dyn OrderService>,
        payments: Arc<dyn PaymentQueryService>,
        observer: Arc<dyn LifecycleObserver>,
    ) -> (Self, CheckoutClient) {
        let (sender, receiver) = mpsc::channel(config.channel_capacity);
        let (signal_tx, signals) = mpsc::unbounded_channel();
        let controller = Self {
            receiver,
            signals,
            signal_tx,
            registry,
            poller: PaymentStatusPoller::new(payments.clone(), config.poll_interval()),
            orders,
            payments,
            observer,
            deadline: config.deadline(),
            tick: config.tick(),
            root: CancellationToken::new(),
            active: None,
            resolved: HashSet::new(),
            resolved_order: VecDeque::new(),
            resolved_history: config.resolved_history,
        };
        (controller, CheckoutClient::new(sender))
    }

    /// Handles commands until every client has been dropped, then stops all background tasks.
    pub async fn run(mut self) {
        info!(
            methods = ?self.registry.methods().map(|m| m.id()).collect::<Vec<_>>(),
            "Controller started"
        );

        loop {
            tokio::select! {
                biased;
                Some(signal) = self.signals.recv() => self.handle_signal(signal).await,
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle_request(request).await,
                    None => break,
                },
            }
        }

        self.root.cancel();
        info!(
            resolved = self.resolved.len(),
            unresolved = ?self.active.as_ref().map(|a| a.order_id),
            "Shutdown"
        );
    }

    async fn handle_request(&mut self, request: CheckoutRequest) {
        match request {
            CheckoutRequest::Checkout {
                method_id,
                cart,
                respond_to,
            } => {
                let result = self.checkout(&method_id, cart).await;
                let _ = respond_to.send(result);
            }
            CheckoutRequest::ConfirmCash {
                order_id,
                respond_to,
            } => {
                let result = self.confirm_cash(order_id).await;
                let _ = respond_to.send(result);
            }
            CheckoutRequest::Cancel {
                order_id,
                respond_to,
            } => {
                let result = self.cancel_order(order_id, CancelReason::Operator).await;
                let _ = respond_to.send(result);
            }
            CheckoutRequest::SwitchMethod {
                order_id,
                respond_to,
            } => {
                let result = self.switch_method(order_id).await;
                let _ = respond_to.send(result);
            }
            CheckoutRequest::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
        }
    }

    async fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::PaymentObserved { order_id } => {
                if let Ok(Resolution::AlreadyResolved) = self.confirm_payment(order_id).await {
                    debug!(%order_id, "Payment observed after resolution, ignored");
                }
            }
            Signal::PollFailed { order_id, detail } => {
                let Some(active) = self.active.as_mut().filter(|a| a.order_id == order_id) else {
                    debug!(%order_id, "Poll failure for inactive order, ignored");
                    return;
                };
                active.poller = None;
                self.report(Some(order_id), &CheckoutError::PollError(detail));
            }
            Signal::DeadlineExpired { order_id } => {
                info!(%order_id, "Deadline expired");
                match self.cancel_order(order_id, CancelReason::Timeout).await {
                    Ok(Resolution::AlreadyResolved) => {
                        debug!(%order_id, "Deadline after resolution, ignored");
                    }
                    // The claim was released; the deadline has to fire again
                    Err(CheckoutError::OrderUpdateFailed(_)) => self.rearm_deadline(order_id),
                    _ => {}
                }
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    async fn checkout(
        &mut self,
        method_id: &str,
        cart: CartSnapshot,
    ) -> Result<CheckoutTicket, CheckoutError> {
        let strategy = self
            .registry
            .resolve(method_id)
            .map_err(|e| self.fail(None, e))?;
        if cart.is_empty() {
            return Err(self.fail(None, CheckoutError::OrderCreationFailed("cart is empty".into())));
        }

        if let Some(previous) = self.active.as_ref().map(|a| a.order_id) {
            info!(%previous, "Retiring unresolved order before checkout");
            self.cancel_order(previous, CancelReason::SwitchMethod).await?;
        }

        let method = strategy.method();
        let draft = OrderDraft::from_cart(method, &cart);
        let total_due = draft.total_due;
        let order_id = self
            .orders
            .create(draft)
            .await
            .map_err(|e| self.fail(None, CheckoutError::OrderCreationFailed(e.to_string())))?;
        info!(%order_id, %method, %total_due, "Order created");

        let initiation = match strategy.initiate(order_id).await {
            Ok(initiation) => initiation,
            Err(e) => {
                self.abandon(order_id, None).await;
                return Err(self.fail(Some(order_id), e));
            }
        };

        if let Err(e) = self.orders.set_status(order_id, OrderStatus::Processing).await {
            // A redirect handle means the gateway already holds a payment record
            let payment = initiation.redirect.clone().map(|handle| PaymentRecordRef {
                order_id,
                method,
                gateway_ref: Some(handle),
            });
            self.abandon(order_id, payment).await;
            return Err(self.fail(
                Some(order_id),
                CheckoutError::OrderUpdateFailed(e.to_string()),
            ));
        }

        let polled = strategy.requires_polling();
        let guard = Arc::new(ResolutionGuard::new());
        let token = self.root.child_token();
        let deadline = Instant::now() + self.deadline;
        self.spawn_countdown(order_id, deadline, guard.clone(), token.clone());
        let poller = polled.then(|| self.start_poller(order_id, &token));

        if let Some(handle) = &initiation.redirect {
            self.observer.on_redirect(order_id, handle);
        }
        info!(%order_id, %method, polled, "Awaiting payment");

        self.active = Some(ActiveOrder {
            order_id,
            method,
            polled,
            redirect: initiation.redirect.clone(),
            guard,
            token,
            poller,
            deadline,
            order_cancelled: false,
            cancel_reason: None,
        });

        Ok(CheckoutTicket {
            order_id,
            method,
            redirect: initiation.redirect,
            total_due,
        })
    }

    async fn confirm_cash(&mut self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        let Some(active) = self.lookup(order_id).map_err(|e| self.fail(Some(order_id), e))? else {
            return Ok(Resolution::AlreadyResolved);
        };
        if !active.method.is_cash() {
            return Err(self.fail(Some(order_id), CheckoutError::NotCashOrder(order_id)));
        }
        self.confirm_payment(order_id).await
    }

    async fn switch_method(&mut self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        let resolution = self
            .cancel_order(order_id, CancelReason::SwitchMethod)
            .await?;
        debug!(%order_id, active = self.active.is_some(), "Method switch done");
        Ok(resolution)
    }

    fn snapshot(&self) -> Option<OrderView> {
        self.active.as_ref().map(|active| OrderView {
            order_id: active.order_id,
            method: active.method,
            phase: if active.order_cancelled {
                OrderPhase::CancelPendingVoid
            } else {
                OrderPhase::AwaitingPayment
            },
            remaining_secs: active
                .deadline
                .saturating_duration_since(Instant::now())
                .as_secs(),
            redirect: active.redirect.clone(),
            polling: active
                .poller
                .as_ref()
                .is_some_and(|poller| !poller.is_finished()),
        })
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Drives the order to Completed.
    ///
    /// If the status update fails the claim is given back and, for polled methods, the
    /// poller is restarted so the payment is observed again.
    async fn confirm_payment(&mut self, order_id: OrderId) -> Result<Resolution, CheckoutError> {
        let Some(active) = self.lookup(order_id).map_err(|e| self.fail(Some(order_id), e))? else {
            return Ok(Resolution::AlreadyResolved);
        };
        let guard = active.guard.clone();
        let polled = active.polled;

        if guard.try_claim(Intent::Complete) != Claim::Won {
            debug!(%order_id, "Completion lost the race");
            return Ok(Resolution::AlreadyResolved);
        }

        if let Err(e) = self.orders.set_status(order_id, OrderStatus::Completed).await {
            guard.release(Intent::Complete);
            if polled {
                self.restart_poller(order_id);
            }
            return Err(self.fail(
                Some(order_id),
                CheckoutError::OrderUpdateFailed(e.to_string()),
            ));
        }

        guard.settle(Intent::Complete);
        self.retire(order_id);
        info!(%order_id, "Order completed");
        self.observer.on_completed(order_id);
        Ok(Resolution::Completed)
    }

    /// Cancels the order, then voids its payment record.
    ///
    /// If the void fails the order stays claimed in `CancelPendingVoid`; calling this again
    /// only retries the void and reports the reason of the first attempt.
    async fn cancel_order(
        &mut self,
        order_id: OrderId,
        reason: CancelReason,
    ) -> Result<Resolution, CheckoutError> {
        let Some(active) = self.lookup(order_id).map_err(|e| self.fail(Some(order_id), e))? else {
            return Ok(Resolution::AlreadyResolved);
        };
        let guard = active.guard.clone();
        let order_cancelled = active.order_cancelled;
        let record = PaymentRecordRef {
            order_id,
            method: active.method,
            gateway_ref: active.redirect.clone(),
        };

        match guard.try_claim(Intent::Cancel) {
            Claim::Won => {}
            Claim::Resumed => info!(%order_id, "Retrying payment void"),
            Claim::Lost => {
                debug!(%order_id, %reason, "Cancellation lost the race");
                return Ok(Resolution::AlreadyResolved);
            }
        }

        if !order_cancelled {
            if let Err(e) = self.orders.set_status(order_id, OrderStatus::Cancelled).await {
                guard.release(Intent::Cancel);
                return Err(self.fail(
                    Some(order_id),
                    CheckoutError::OrderUpdateFailed(e.to_string()),
                ));
            }
            if let Some(active) = self.active.as_mut() {
                active.order_cancelled = true;
                active.cancel_reason = Some(reason);
                active.poller = None;
                active.token.cancel();
            }
        }

        if let Err(e) = self.payments.void_payment(&record).await {
            return Err(self.fail(
                Some(order_id),
                CheckoutError::PaymentVoidFailed(e.to_string()),
            ));
        }

        guard.settle(Intent::Cancel);
        let reason = self
            .active
            .as_ref()
            .and_then(|a| a.cancel_reason)
            .unwrap_or(reason);
        self.retire(order_id);
        info!(%order_id, %reason, "Order cancelled");
        self.observer.on_cancelled(order_id, reason);
        Ok(Resolution::Cancelled(reason))
    }

    /// Cancels an order that never reached Processing and voids `payment` if the gateway
    /// already issued one. The order only counts as resolved once both steps went through;
    /// failures are reported and the order is left to the operator.
    async fn abandon(&mut self, order_id: OrderId, payment: Option<PaymentRecordRef>) {
        if let Err(e) = self.orders.set_status(order_id, OrderStatus::Cancelled).await {
            self.report(Some(order_id), &CheckoutError::OrderUpdateFailed(e.to_string()));
            return;
        }
        if let Some(record) = payment {
            if let Err(e) = self.payments.void_payment(&record).await {
                self.report(Some(order_id), &CheckoutError::PaymentVoidFailed(e.to_string()));
                return;
            }
        }
        info!(%order_id, "Abandoned order cancelled");
        self.mark_resolved(order_id);
    }

    /// Stops every task bound to the active order and forgets it.
    fn retire(&mut self, order_id: OrderId) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
        }
        self.mark_resolved(order_id);
    }

    fn mark_resolved(&mut self, order_id: OrderId) {
        if !self.resolved.insert(order_id) {
            return;
        }
        self.resolved_order.push_back(order_id);
        while self.resolved_order.len() > self.resolved_history {
            if let Some(oldest) = self.resolved_order.pop_front() {
                self.resolved.remove(&oldest);
            }
        }
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Ticks the observer every `tick` and raises the deadline signal once.
    fn spawn_countdown(
        &self,
        order_id: OrderId,
        deadline: Instant,
        guard: Arc<ResolutionGuard>,
        token: CancellationToken,
    ) {
        let observer = self.observer.clone();
        let signals = self.signal_tx.clone();
        let period = self.tick;

        let span = tracing::info_span!("countdown", %order_id);
        tokio::spawn(
            async move {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            debug!("Countdown cancelled");
                            return;
                        }
                        _ = sleep_until(deadline) => {
                            let _ = signals.send(Signal::DeadlineExpired { order_id });
                            return;
                        }
                        _ = ticker.tick() => {
                            if guard.is_open() {
                                let remaining = deadline.saturating_duration_since(Instant::now());
                                observer.on_awaiting_payment(order_id, remaining.as_secs());
                            }
                        }
                    }
                }
            }
            .instrument(span),
        );
    }

    /// Raises the deadline signal again one tick from now. Used when a timeout could not
    /// cancel the order; stops with the order's token.
    fn rearm_deadline(&self, order_id: OrderId) {
        let Some(active) = self.active.as_ref().filter(|a| a.order_id == order_id) else {
            return;
        };
        let token = active.token.clone();
        let signals = self.signal_tx.clone();
        let delay = self.tick;
        info!(%order_id, retry_ms = delay.as_millis() as u64, "Deadline re-armed");

        let span = tracing::info_span!("deadline_retry", %order_id);
        tokio::spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => debug!("Deadline retry cancelled"),
                    _ = sleep(delay) => {
                        let _ = signals.send(Signal::DeadlineExpired { order_id });
                    }
                }
            }
            .instrument(span),
        );
    }

    fn start_poller(&self, order_id: OrderId, token: &CancellationToken) -> PollerHandle {
        let signals = self.signal_tx.clone();
        self.poller.start(order_id, token, move |outcome| {
            let signal = match outcome {
                PollOutcome::Paid => Signal::PaymentObserved { order_id },
                PollOutcome::Failed(detail) => Signal::PollFailed { order_id, detail },
            };
            let _ = signals.send(signal);
        })
    }

    fn restart_poller(&mut self, order_id: OrderId) {
        let Some(token) = self.active.as_ref().map(|a| a.token.clone()) else {
            return;
        };
        info!(%order_id, "Restarting poller");
        let handle = self.start_poller(order_id, &token);
        if let Some(active) = self.active.as_mut() {
            active.poller = Some(handle);
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// `Ok(None)` when the order was resolved earlier in this session.
    fn lookup(&self, order_id: OrderId) -> Result<Option<&ActiveOrder>, CheckoutError> {
        match &self.active {
            Some(active) if active.order_id == order_id => Ok(Some(active)),
            _ if self.resolved.contains(&order_id) => Ok(None),
            _ => Err(CheckoutError::UnknownOrder(order_id)),
        }
    }

    fn report(&self, order_id: Option<OrderId>, err: &CheckoutError) {
        warn!(order_id = ?order_id, kind = %err.kind(), error = %err, "Checkout error");
        self.observer.on_error(order_id, err.kind(), &err.detail());
    }

    fn fail(&self, order_id: Option<OrderId>, err: CheckoutError) -> CheckoutError {
        self.report(order_id, &err);
        err
    }
}
