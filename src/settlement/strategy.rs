use crate::error::CheckoutError;
use crate::model::{GatewayRef, OrderId, PaymentMethod};
use async_trait::async_trait;

/// What a strategy hands back after starting settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitiationResult {
    /// Handle the operator opens to complete payment. `None` for cash.
    pub redirect: Option<GatewayRef>,
}

impl InitiationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn redirect(handle: GatewayRef) -> Self {
        Self {
            redirect: Some(handle),
        }
    }
}

/// One implementation per settlement method.
///
/// A strategy only *starts* settlement. Whether the order is paid is decided later by the
/// lifecycle controller, from poller reports or operator confirmation.
#[async_trait]
pub trait SettlementStrategy: Send + Sync {
    fn method(&self) -> PaymentMethod;

    /// Whether orders settled this way have an external status to poll.
    fn requires_polling(&self) -> bool;

    async fn initiate(&self, order_id: OrderId) -> Result<InitiationResult, CheckoutError>;
}
