use crate::store::message::StoreRequest;
use crate::store::{StoreEntity, StoreError};
use tokio::sync::{mpsc, oneshot};

/// Cloneable handle to a [`RecordActor`](crate::store::RecordActor).
///
/// Holds only the request sender. The actor shuts down once every clone is dropped.
#[derive(Clone)]
pub struct RecordClient<T: StoreEntity> {
    sender: mpsc::Sender<StoreRequest<T>>,
}

impl<T: StoreEntity> RecordClient<T> {
    pub fn new(sender: mpsc::Sender<StoreRequest<T>>) -> Self {
        Self { sender }
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Create { params, respond_to })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Get { id, respond_to })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(StoreRequest::Action {
                id,
                action,
                respond_to,
            })
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }
}
