//! In-process record store built on the actor model.
//!
//! - [`StoreEntity`] - trait a record type implements
//! - [`RecordActor`] - task that owns the records and applies requests sequentially
//! - [`RecordClient`] - cloneable, type-safe handle used to talk to the actor
//! - [`StoreError`] - plumbing errors and entity rejections
//!
//! The in-memory [`OrderService`](crate::services::OrderService) is built on this module.

pub mod actor;
pub mod client;
pub mod entity;
pub mod error;
pub mod message;

pub use actor::RecordActor;
pub use client::RecordClient;
pub use entity::StoreEntity;
pub use error::StoreError;
pub use message::{Response, StoreRequest};
