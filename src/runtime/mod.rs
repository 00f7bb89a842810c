//! Runtime orchestration.
//!
//! - [`CheckoutSystem`] - spawns the lifecycle controller and its order store, and shuts
//!   them down
//! - [`setup_tracing`] - initializes logging

pub mod checkout_system;
pub mod tracing;

pub use self::checkout_system::*;
pub use self::tracing::*;
