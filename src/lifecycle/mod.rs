//! # Order Payment Lifecycle
//!
//! Takes a cart to exactly one of `Completed` or `Cancelled`.
//!
//! ```text
//!   checkout ──▶ Pending ──initiate──▶ Processing ──┬── paid / cash confirmed ──▶ Completed
//!                                                   └── cancel / switch / timeout ─▶ Cancelled
//! ```
//!
//! Three sources race to resolve a Processing order: the status poller (gateway methods
//! only), the deadline countdown, and the operator. The first to claim the order's
//! [`ResolutionGuard`](guard::ResolutionGuard) decides; the others observe
//! [`Resolution::AlreadyResolved`] and change nothing.
//!
//! Cancelling is two steps: the order record is cancelled, then its payment record is
//! voided. If the void fails the order sits in [`OrderPhase::CancelPendingVoid`] until a
//! retried cancel (or the next checkout) voids it.
//!
//! Everything the operator needs to see is pushed through a [`LifecycleObserver`].
//!
//! # Example
//! ```ignore
//! let ticket = client.checkout("cash", cart).await?;
//! // ... cash handed over ...
//! assert_eq!(client.confirm_cash(ticket.order_id).await?, Resolution::Completed);
//! ```

pub mod actor;
pub mod client;
pub mod events;
pub mod guard;
pub mod message;

pub use actor::OrderLifecycleController;
pub use client::CheckoutClient;
pub use events::{CancelReason, ChannelObserver, LifecycleEvent, LifecycleObserver};
pub use guard::ResolutionGuard;
pub use message::{CheckoutRequest, CheckoutTicket, OrderPhase, OrderView, Resolution};
