//! Messages exchanged between [`RecordClient`](crate::store::RecordClient) and
//! [`RecordActor`](crate::store::RecordActor).

use crate::store::{StoreEntity, StoreError};
use tokio::sync::oneshot;

/// One-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum StoreRequest<T: StoreEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}
