//! # POS Checkout
//!
//! > **Order payment lifecycle for a point-of-sale terminal.**
//!
//! Takes a cart, creates an order, hands it to a settlement method (a redirect-based
//! payment gateway, or cash) and resolves it to exactly one of *completed* or *cancelled*,
//! no matter how the poller, the deadline and the operator race each other.
//!
//! ## 🚀 Core Concepts
//!
//! ### One Owner per Order
//! The [`OrderLifecycleController`](lifecycle::OrderLifecycleController) is an actor. It
//! owns the active order and processes operator commands and background signals one at a
//! time. Background tasks (status poller, deadline countdown) only send signals; they never
//! change an order themselves.
//!
//! ### First Writer Wins
//! Every path that resolves an order claims a one-shot
//! [`ResolutionGuard`](lifecycle::ResolutionGuard) first. Losers get
//! [`Resolution::AlreadyResolved`](lifecycle::Resolution), which is an outcome, not an error.
//!
//! ### Cancellation Trees
//! Each order's tasks hang off one `CancellationToken`. Resolving or replacing the order
//! cancels the token, and with it everything the order started.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Data ([`model`])
//! Carts, orders, payment methods and gateway reports. Money is `rust_decimal::Decimal`.
//!
//! ### 2. The Collaborators ([`services`])
//! [`OrderService`](services::OrderService) and
//! [`PaymentQueryService`](services::PaymentQueryService) contracts, an in-memory order
//! service built on the generic [`store`] actor, and scriptable mocks.
//!
//! ### 3. The Methods ([`settlement`])
//! One [`SettlementStrategy`](settlement::SettlementStrategy) per payment method, looked up
//! through the [`StrategyRegistry`](settlement::StrategyRegistry).
//!
//! ### 4. The Orchestrator ([`lifecycle`], [`poller`])
//! The controller, its client, the resolution guard and the observer surface.
//!
//! ### 5. The Plumbing ([`runtime`], [`config`], [`error`])
//! [`CheckoutSystem`](runtime::CheckoutSystem) wiring and shutdown, `CHECKOUT_*`
//! configuration, the error taxonomy.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod poller;
pub mod runtime;
pub mod services;
pub mod settlement;
pub mod store;
