//! # Payment Status Poller
//!
//! Queries the payment query service on a fixed interval until one of:
//!
//! 1. the gateway reports the payment as paid: [`PollOutcome::Paid`] is reported, polling stops;
//! 2. a query fails: [`PollOutcome::Failed`] is reported, polling stops, the order is left alone;
//! 3. the [`PollerHandle`] is dropped or its parent token cancelled: polling stops and
//!    nothing is reported.
//!
//! The poller has no side effects on the order. It only reports.

use crate::model::OrderId;
use crate::services::PaymentQueryService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// What a poll run ended with, when it ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Paid,
    Failed(String),
}

#[derive(Clone)]
pub struct PaymentStatusPoller {
    payments: Arc<dyn PaymentQueryService>,
    interval: Duration,
}

impl PaymentStatusPoller {
    pub fn new(payments: Arc<dyn PaymentQueryService>, interval: Duration) -> Self {
        Self { payments, interval }
    }

    /// Starts polling `order_id`. The first query is issued one interval from now.
    ///
    /// `on_outcome` runs at most once, from the polling task. The run is also bound to
    /// `parent`: cancelling it stops the poller exactly like dropping the handle.
    pub fn start<F>(&self, order_id: OrderId, parent: &CancellationToken, on_outcome: F) -> PollerHandle
    where
        F: FnOnce(PollOutcome) + Send + 'static,
    {
        let token = parent.child_token();
        let payments = self.payments.clone();
        let period = self.interval;
        let stop = token.clone();

        let span = tracing::info_span!("poller", %order_id);
        let task = tokio::spawn(
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                info!(interval_ms = period.as_millis() as u64, "Polling started");

                let outcome = loop {
                    tokio::select! {
                        biased;
                        _ = stop.cancelled() => {
                            debug!("Polling cancelled");
                            return;
                        }
                        _ = ticker.tick() => {}
                    }

                    let result = tokio::select! {
                        biased;
                        _ = stop.cancelled() => {
                            debug!("Polling cancelled mid-query");
                            return;
                        }
                        result = payments.get_status(order_id) => result,
                    };

                    match result {
                        Ok(status) if status.gateway_status.is_paid() => {
                            info!("Payment observed");
                            break PollOutcome::Paid;
                        }
                        Ok(status) => {
                            debug!(status = ?status.gateway_status, "Not paid yet");
                        }
                        Err(e) => {
                            warn!(error = %e, "Status query failed, polling stopped");
                            break PollOutcome::Failed(e.to_string());
                        }
                    }
                };

                if !stop.is_cancelled() {
                    on_outcome(outcome);
                }
            }
            .instrument(span),
        );

        PollerHandle { token, task }
    }
}

/// Cancellable handle to a running poll loop. Dropping it stops the loop.
pub struct PollerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
