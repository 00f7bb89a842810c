//! Demo: one cash sale and one gateway sale against the in-memory order store.
//!
//! The gateway is the scripted [`MockPaymentService`], which reports the payment as paid a
//! few seconds after checkout.

use pos_checkout::config::CheckoutConfig;
use pos_checkout::lifecycle::{ChannelObserver, LifecycleEvent};
use pos_checkout::model::{CartLine, CartSnapshot, OrderId};
use pos_checkout::runtime::{setup_tracing, CheckoutSystem};
use pos_checkout::services::mock::MockPaymentService;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = CheckoutConfig::from_env();
    info!(?config, "Starting checkout demo");

    let payments = MockPaymentService::new().pays_after(Duration::from_secs(7));
    let (observer, mut events) = ChannelObserver::new();
    let system = CheckoutSystem::in_memory(config, Arc::new(payments), Arc::new(observer));

    // Cash sale: 3 espresso, confirmed by the operator
    let cart = CartSnapshot::new(vec![CartLine::new("espresso", 3, Decimal::from(50_000))]);
    let span = tracing::info_span!("cash_sale");
    async {
        let ticket = system
            .checkout
            .checkout("cash", cart)
            .await
            .map_err(|e| e.to_string())?;
        info!(order_id = %ticket.order_id, total_due = %ticket.total_due, "Collect cash");
        let resolution = system
            .checkout
            .confirm_cash(ticket.order_id)
            .await
            .map_err(|e| e.to_string())?;
        info!(?resolution, "Cash sale done");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    // Gateway sale: resolved by the poller
    let cart = CartSnapshot::new(vec![
        CartLine::new("latte-l", 2, Decimal::from(65_000)),
        CartLine::new("croissant", 1, Decimal::from(35_000)),
    ])
    .with_discount(Decimal::from(15_000))
    .with_tax_rate(Decimal::new(8, 2));
    let span = tracing::info_span!("gateway_sale");
    async {
        let ticket = system
            .checkout
            .checkout("momo", cart)
            .await
            .map_err(|e| e.to_string())?;
        info!(order_id = %ticket.order_id, total_due = %ticket.total_due, "Waiting for payment");
        wait_for_resolution(&mut events, ticket.order_id).await;
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    if let Some(orders) = system.orders() {
        for id in 1..=2 {
            match orders.get(OrderId(id)).await {
                Ok(Some(order)) => info!(order_id = %order.id, history = ?order.history, "Final record"),
                Ok(None) => error!(id, "Order missing"),
                Err(e) => error!(error = %e, "Could not read order"),
            }
        }
    }

    system.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}

async fn wait_for_resolution(events: &mut UnboundedReceiver<LifecycleEvent>, order_id: OrderId) {
    while let Some(event) = events.recv().await {
        match event {
            LifecycleEvent::AwaitingPayment { remaining_secs, .. } if remaining_secs % 5 == 0 => {
                info!(remaining_secs, "Still waiting");
            }
            LifecycleEvent::RedirectReady { handle, .. } => info!(%handle, "Open on the customer display"),
            LifecycleEvent::Completed { order_id: id } if id == order_id => {
                info!(%order_id, "Gateway sale done");
                return;
            }
            LifecycleEvent::Cancelled { order_id: id, reason } if id == order_id => {
                info!(%order_id, %reason, "Gateway sale cancelled");
                return;
            }
            LifecycleEvent::Error { kind, detail, .. } => error!(%kind, %detail, "Checkout error"),
            _ => {}
        }
    }
}
