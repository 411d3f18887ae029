//! The top-level error type (§7): each module owns a distinct failure
//! domain; this wraps them so `main` and the orchestrator can propagate
//! with `?` and report one coherent error at the process boundary.

use thiserror::Error;

use crate::capabilities::{FilesError, LlmError};
use crate::config::ConfigError;
use crate::executor::ExecutorError;
use crate::planner::PlannerError;
use crate::workflow_store::StoreOpError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error(transparent)]
    Store(#[from] StoreOpError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Files(#[from] FilesError),
}
