/// Errors raised by the record store plumbing or passed through from an entity.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record rejected request: {0}")]
    Rejected(Box<dyn std::error::Error + Send + Sync>),
}
