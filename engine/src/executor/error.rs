use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("workflow store error: {0}")]
    Store(String),

    #[error("workflow not found: {0}")]
    NotFound(String),

    #[error("workflow has an invalid dependency graph: {}", path.join(" -> "))]
    InvalidGraph { path: Vec<String> },
}
