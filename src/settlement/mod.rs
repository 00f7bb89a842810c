//! # Settlement Strategies
//!
//! A settlement strategy knows how to *start* payment for one method:
//!
//! - [`GatewayRedirectStrategy`] - asks the payment query service for a redirect handle the
//!   operator opens; the order is then resolved by polling.
//! - [`CashStrategy`] - does nothing; the order waits for the operator to confirm cash.
//!
//! [`StrategyRegistry`] resolves method identifiers to strategies and rejects anything it
//! was not built with.

pub mod cash;
pub mod gateway;
pub mod registry;
pub mod strategy;

pub use cash::CashStrategy;
pub use gateway::GatewayRedirectStrategy;
pub use registry::StrategyRegistry;
pub use strategy::{InitiationResult, SettlementStrategy};
