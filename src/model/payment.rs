//! Payment-side values: the closed set of settlement methods and what the
//! payment query service reports about an order.

use crate::model::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Redirect-based gateway providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    Momo,
    VnPay,
}

/// Every settlement method the terminal knows about.
///
/// Method identifiers coming from the UI or configuration are parsed into this enum at the
/// boundary; an identifier that does not parse is an unsupported method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PaymentMethod {
    Cash,
    Gateway(GatewayProvider),
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Gateway(GatewayProvider::Momo),
        PaymentMethod::Gateway(GatewayProvider::VnPay),
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Gateway(GatewayProvider::Momo) => "momo",
            PaymentMethod::Gateway(GatewayProvider::VnPay) => "vnpay",
        }
    }

    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Identifier that does not name any known settlement method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownMethod;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        method.id().to_string()
    }
}

/// Provider-reported state of a payment record. Polled, never pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayStatus {
    Pending,
    /// The only status the poller treats as terminal.
    Paid,
    Failed,
    Other(String),
}

impl GatewayStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, GatewayStatus::Paid)
    }
}

impl From<&str> for GatewayStatus {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "PENDING" => GatewayStatus::Pending,
            "PAID" | "SUCCESS" => GatewayStatus::Paid,
            "FAILED" => GatewayStatus::Failed,
            _ => GatewayStatus::Other(raw.to_string()),
        }
    }
}

/// Method-specific reference for a payment record, e.g. the redirect handle the operator opens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatewayRef(pub String);

impl Display for GatewayRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of `PaymentQueryService::get_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentStatus {
    pub gateway_status: GatewayStatus,
    pub gateway_ref: Option<GatewayRef>,
}

/// Enough to address the active payment record of an order when voiding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecordRef {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub gateway_ref: Option<GatewayRef>,
}
