//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by
//! `RUST_LOG`. Module paths are hidden (`with_target(false)`); every event carries the
//! structured fields that matter instead (`order_id`, `method`, `reason`, `error`).
//!
//! ## What Gets Traced
//!
//! - **Controller**: startup, shutdown, each order created, resolved or abandoned
//! - **Background tasks**: `poller` and `countdown` spans keyed by `order_id`
//! - **Order store**: record creation and status actions, tagged with `record_type`
//! - **Errors**: every error reported to the observer is also logged at `warn`
//!
//! ## Usage Examples
//!
//! ```bash
//! # Order lifecycle only
//! RUST_LOG=info cargo run
//!
//! # Every poll and full cart payloads
//! RUST_LOG=debug cargo run
//!
//! # Including countdown ticks
//! RUST_LOG=trace cargo run
//!
//! # Quiet store, chatty controller
//! RUST_LOG=info,pos_checkout::lifecycle=debug cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! A gateway sale with `RUST_LOG=info`:
//!
//! ```text
//! INFO Created record_type="Order" id=order_1 size=1
//! INFO Order created order_id=order_1 method=momo total_due=150000
//! INFO poller: Polling started order_id=order_1 interval_ms=3000
//! INFO Awaiting payment order_id=order_1 method=momo polled=true
//! INFO poller: Payment observed order_id=order_1
//! INFO Order completed order_id=order_1
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
