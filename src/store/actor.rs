//! # Record Actor
//!
//! `RecordActor<T>` owns every record of one entity type and processes requests one at a
//! time, so the records themselves need no locking. A record action either applies fully
//! or is rejected; rejected actions leave the record untouched.

use crate::store::message::StoreRequest;
use crate::store::{RecordClient, StoreEntity, StoreError};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct RecordActor<T: StoreEntity> {
    receiver: mpsc::Receiver<StoreRequest<T>>,
    records: HashMap<T::Id, T>,
    next_id: u64,
}

impl<T: StoreEntity> RecordActor<T> {
    /// Creates the actor and a client bound to it.
    ///
    /// `buffer_size` is the request channel capacity; callers wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, RecordClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            records: HashMap::new(),
            next_id: 1,
        };
        (actor, RecordClient::new(sender))
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        let record_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(record_type, "Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Create { params, respond_to } => {
                    debug!(record_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    match T::from_create(id.clone(), params) {
                        Ok(record) => {
                            self.next_id += 1;
                            self.records.insert(id.clone(), record);
                            info!(record_type, %id, size = self.records.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(record_type, error = %e, "Create rejected");
                            let _ = respond_to.send(Err(StoreError::Rejected(Box::new(e))));
                        }
                    }
                }
                StoreRequest::Get { id, respond_to } => {
                    let record = self.records.get(&id).cloned();
                    debug!(record_type, %id, found = record.is_some(), "Get");
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(record_type, %id, ?action, "Action");
                    let Some(record) = self.records.get_mut(&id) else {
                        warn!(record_type, %id, "Not found");
                        let _ = respond_to.send(Err(StoreError::NotFound(id.to_string())));
                        continue;
                    };
                    let result = record
                        .handle_action(action)
                        .map_err(|e| StoreError::Rejected(Box::new(e)));
                    match &result {
                        Ok(_) => info!(record_type, %id, "Action ok"),
                        Err(e) => warn!(record_type, %id, error = %e, "Action rejected"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(record_type, size = self.records.len(), "Shutdown");
    }
}
