use crate::error::CheckoutError;
use crate::model::{GatewayProvider, OrderId, PaymentMethod};
use crate::services::PaymentQueryService;
use crate::settlement::{InitiationResult, SettlementStrategy};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Redirect-based gateway. Asks the payment query service for the order's payment
/// details and surfaces the redirect handle for the operator to open.
#[derive(Clone)]
pub struct GatewayRedirectStrategy {
    provider: GatewayProvider,
    payments: Arc<dyn PaymentQueryService>,
}

impl GatewayRedirectStrategy {
    pub fn new(provider: GatewayProvider, payments: Arc<dyn PaymentQueryService>) -> Self {
        Self { provider, payments }
    }
}

#[async_trait]
impl SettlementStrategy for GatewayRedirectStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Gateway(self.provider)
    }

    fn requires_polling(&self) -> bool {
        true
    }

    #[instrument(skip(self), fields(method = %self.method()))]
    async fn initiate(&self, order_id: OrderId) -> Result<InitiationResult, CheckoutError> {
        let status = self.payments.get_status(order_id).await.map_err(|e| {
            warn!(error = %e, "Payment details query failed");
            CheckoutError::GatewayUnavailable(e.to_string())
        })?;

        let Some(handle) = status.gateway_ref else {
            warn!("Gateway returned no redirect handle");
            return Err(CheckoutError::GatewayUnavailable(format!(
                "{} returned no payment details for {}",
                self.method(),
                order_id
            )));
        };

        info!(%handle, "Redirect ready");
        Ok(InitiationResult::redirect(handle))
    }
}
