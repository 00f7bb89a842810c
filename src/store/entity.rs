//! # StoreEntity Trait
//!
//! The contract a record type implements to be kept by a [`RecordActor`](crate::store::RecordActor).
//!
//! Records in this crate are created and then only moved forward through domain actions;
//! nothing is ever updated wholesale or deleted. The trait therefore has two hooks:
//! construction from a creation payload, and a typed action handler that is free to
//! reject transitions the record does not allow.

use std::fmt::{Debug, Display};
use std::hash::Hash;

pub trait StoreEntity: Clone + Send + Sync + 'static {
    /// Identifier assigned by the store. Built from a monotonically increasing counter.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u64>;

    /// The data required to create a new record.
    type Create: Send + Sync + Debug;

    /// Record-specific operations (e.g. `SetStatus`).
    type Action: Send + Sync + Debug;

    /// The result type returned by actions.
    type ActionResult: Send + Sync + Debug;

    /// Rejection raised by `from_create` or `handle_action`.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the record from its freshly assigned id and payload.
    fn from_create(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Apply an action. On `Err` the record must be left unchanged.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, Self::Error>;
}
