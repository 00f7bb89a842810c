//! Pure data structures (DTOs) shared by the checkout flow.
//!
//! [`Order`] implements [`StoreEntity`](crate::store::StoreEntity) so it can be kept by a
//! [`RecordActor`](crate::store::RecordActor); the rest are plain values.

pub mod cart;
pub mod order;
pub mod payment;

pub use cart::*;
pub use order::*;
pub use payment::*;
