use crate::config::CheckoutConfig;
use crate::lifecycle::{CheckoutClient, LifecycleObserver, OrderLifecycleController};
use crate::services::{InMemoryOrderService, OrderService, PaymentQueryService};
use crate::settlement::StrategyRegistry;
use std::sync::Arc;
use tracing::{error, info};

/// Wires the checkout flow together and owns its tasks.
///
/// `CheckoutSystem` is responsible for:
/// - **Wiring**: building the strategy registry from the enabled methods and handing the
///   controller its services and observer
/// - **Lifecycle**: spawning the controller (and the in-memory order store, if used) and
///   shutting them down in order
///
/// # Example
///
/// ```ignore
/// let system = CheckoutSystem::in_memory(CheckoutConfig::from_env(), payments, observer);
///
/// let ticket = system.checkout.checkout("cash", cart).await?;
/// system.checkout.confirm_cash(ticket.order_id).await?;
///
/// system.shutdown().await?;
/// ```
pub struct CheckoutSystem {
    /// Client for the lifecycle controller
    pub checkout: CheckoutClient,

    /// The built-in order store, when the system was started with one
    orders: Option<InMemoryOrderService>,

    /// Task handles, controller first (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl CheckoutSystem {
    /// Starts the controller against externally provided services.
    pub fn new(
        config: CheckoutConfig,
        orders: Arc<dyn OrderService>,
        payments: Arc<dyn PaymentQueryService>,
        observer: Arc<dyn LifecycleObserver>,
    ) -> Self {
        let registry = StrategyRegistry::new(&config.methods, payments.clone());
        let (controller, checkout) =
            OrderLifecycleController::new(&config, registry, orders, payments, observer);
        let handle = tokio::spawn(controller.run());

        Self {
            checkout,
            orders: None,
            handles: vec![handle],
        }
    }

    /// Starts the controller with an in-process order store.
    pub fn in_memory(
        config: CheckoutConfig,
        payments: Arc<dyn PaymentQueryService>,
        observer: Arc<dyn LifecycleObserver>,
    ) -> Self {
        let (store, orders) = InMemoryOrderService::spawnable(config.channel_capacity);
        let store_handle = tokio::spawn(store.run());

        let mut system = Self::new(config, Arc::new(orders.clone()), payments, observer);
        system.orders = Some(orders);
        // The store must outlive the controller
        system.handles.push(store_handle);
        system
    }

    /// The in-process order store, for inspection.
    ///
    /// Clones keep the store alive; drop them before calling [`shutdown`](Self::shutdown).
    pub fn orders(&self) -> Option<&InMemoryOrderService> {
        self.orders.as_ref()
    }

    /// Gracefully shuts down the system.
    ///
    /// Dropping the client closes the controller's command channel; the controller cancels
    /// whatever is still running and exits, releasing its order service. The order store
    /// follows once its last client is gone.
    ///
    /// An order still unresolved at shutdown is left as it is.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down checkout...");

        drop(self.checkout);
        drop(self.orders);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Task failed: {:?}", e);
                return Err(format!("Task failed: {:?}", e));
            }
        }

        info!("Checkout shutdown complete.");
        Ok(())
    }
}
