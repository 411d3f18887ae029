use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreOpError {
    #[error("failed to open workflow store: {0}")]
    Open(String),

    #[error("workflow store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("workflow store actor is gone")]
    Channel,
}
