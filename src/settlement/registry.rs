use crate::error::CheckoutError;
use crate::model::{GatewayProvider, PaymentMethod};
use crate::services::PaymentQueryService;
use crate::settlement::{CashStrategy, GatewayRedirectStrategy, SettlementStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Maps a payment-method identifier to its [`SettlementStrategy`].
///
/// Built once at startup from the fixed method table below, restricted to the methods
/// enabled in configuration. It is never mutated afterwards; `resolve` fails closed.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<PaymentMethod, Arc<dyn SettlementStrategy>>,
}

impl StrategyRegistry {
    pub fn new(enabled: &[PaymentMethod], payments: Arc<dyn PaymentQueryService>) -> Self {
        let strategies: HashMap<_, _> = enabled
            .iter()
            .map(|method| (*method, Self::strategy_for(*method, payments.clone())))
            .collect();
        info!(
            methods = ?strategies.keys().map(PaymentMethod::id).collect::<Vec<_>>(),
            "Strategy registry built"
        );
        Self { strategies }
    }

    fn strategy_for(
        method: PaymentMethod,
        payments: Arc<dyn PaymentQueryService>,
    ) -> Arc<dyn SettlementStrategy> {
        match method {
            PaymentMethod::Cash => Arc::new(CashStrategy),
            PaymentMethod::Gateway(provider @ (GatewayProvider::Momo | GatewayProvider::VnPay)) => {
                Arc::new(GatewayRedirectStrategy::new(provider, payments))
            }
        }
    }

    /// Look up the strategy for a raw method identifier.
    pub fn resolve(&self, method_id: &str) -> Result<Arc<dyn SettlementStrategy>, CheckoutError> {
        let method: PaymentMethod = method_id
            .parse()
            .map_err(|_| CheckoutError::UnsupportedMethod(method_id.to_string()))?;
        self.resolve_method(method)
    }

    pub fn resolve_method(
        &self,
        method: PaymentMethod,
    ) -> Result<Arc<dyn SettlementStrategy>, CheckoutError> {
        debug!(%method, "Resolving strategy");
        self.strategies
            .get(&method)
            .cloned()
            .ok_or_else(|| CheckoutError::UnsupportedMethod(method.id().to_string()))
    }

    pub fn methods(&self) -> impl Iterator<Item = PaymentMethod> + '_ {
        self.strategies.keys().copied()
    }
}
