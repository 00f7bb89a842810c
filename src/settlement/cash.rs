use crate::error::CheckoutError;
use crate::model::{OrderId, PaymentMethod};
use crate::settlement::{InitiationResult, SettlementStrategy};
use async_trait::async_trait;
use tracing::debug;

/// Manual cash handling. Nothing to call, nothing to poll: the order waits for the
/// operator to confirm the cash was received.
#[derive(Debug, Clone, Copy, Default)]
pub struct CashStrategy;

#[async_trait]
impl SettlementStrategy for CashStrategy {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cash
    }

    fn requires_polling(&self) -> bool {
        false
    }

    async fn initiate(&self, order_id: OrderId) -> Result<InitiationResult, CheckoutError> {
        debug!(%order_id, "Awaiting cash confirmation");
        Ok(InitiationResult::empty())
    }
}
