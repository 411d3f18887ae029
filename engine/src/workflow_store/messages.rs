use tokio::sync::oneshot;

use crate::domain::{Task, Workflow};

use super::{LoadedWorkflow, StoreOpError, TaskDelta};

pub type StoreResponse<T> = Result<T, StoreOpError>;

#[derive(Debug)]
pub enum StoreCommand {
    Create {
        workflow: Workflow,
        tasks: Vec<Task>,
        reply: oneshot::Sender<StoreResponse<String>>,
    },
    Load {
        workflow_id: String,
        reply: oneshot::Sender<StoreResponse<Option<LoadedWorkflow>>>,
    },
    UpdateTask {
        workflow_id: String,
        task_id: String,
        delta: TaskDelta,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
}
