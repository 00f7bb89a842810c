//! Runtime configuration for the checkout flow.
//!
//! Values come from `CHECKOUT_*` environment variables. Anything missing or unparseable
//! falls back to its default with a warning.
//!
//! | Variable                    | Default          |
//! |-----------------------------|------------------|
//! | `CHECKOUT_POLL_INTERVAL_MS` | `3000`           |
//! | `CHECKOUT_DEADLINE_SECS`    | `300`            |
//! | `CHECKOUT_TICK_MS`          | `1000`           |
//! | `CHECKOUT_METHODS`          | `cash,momo,vnpay`|
//! | `CHECKOUT_CHANNEL_CAPACITY` | `32`             |
//! | `CHECKOUT_RESOLVED_HISTORY` | `256`            |

use crate::model::PaymentMethod;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub poll_interval_ms: u64,
    /// Measured from the moment the order enters Processing.
    pub deadline_secs: u64,
    pub tick_ms: u64,
    pub methods: Vec<PaymentMethod>,
    pub channel_capacity: usize,
    /// How many resolved order ids the controller remembers. Older ids are answered as
    /// unknown orders.
    pub resolved_history: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3_000,
            deadline_secs: 300,
            tick_ms: 1_000,
            methods: PaymentMethod::ALL.to_vec(),
            channel_capacity: 32,
            resolved_history: 256,
        }
    }
}

impl CheckoutConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let methods = match lookup("CHECKOUT_METHODS") {
            Some(raw) => parse_methods(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Invalid CHECKOUT_METHODS, using defaults");
                defaults.methods.clone()
            }),
            None => defaults.methods.clone(),
        };

        Self {
            poll_interval_ms: parse_or(&lookup, "CHECKOUT_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            deadline_secs: parse_or(&lookup, "CHECKOUT_DEADLINE_SECS", defaults.deadline_secs),
            tick_ms: parse_or(&lookup, "CHECKOUT_TICK_MS", defaults.tick_ms),
            methods,
            channel_capacity: parse_or(&lookup, "CHECKOUT_CHANNEL_CAPACITY", defaults.channel_capacity),
            resolved_history: parse_or(&lookup, "CHECKOUT_RESOLVED_HISTORY", defaults.resolved_history),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        // Zero would spin the timers or deadlock the channel
        Ok(value) if value > T::default() => value,
        _ => {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }
    }
}

/// Comma-separated method identifiers. `None` if any entry is unknown or the list is empty.
fn parse_methods(raw: &str) -> Option<Vec<PaymentMethod>> {
    let mut methods = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        let method: PaymentMethod = id.parse().ok()?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    (!methods.is_empty()).then_some(methods)
}
