//! C4: persists workflows and tasks; one actor owns the [`taskstore::Store`]
//! handle so concurrent callers are serialized by the channel, not a lock
//! they could forget to take (I6).

mod error;
mod messages;

pub use error::StoreOpError;

use std::path::Path;

use taskstore::{Filter, FilterOp, IndexValue, Store};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{Task, TaskResult, TaskState, Workflow, WorkflowStatus};
use messages::{StoreCommand, StoreResponse};

/// Everything needed to materialize a workflow: the workflow record plus
/// every task that belongs to it (§4.4: `load(id) -> workflow`).
#[derive(Debug, Clone)]
pub struct LoadedWorkflow {
    pub workflow: Workflow,
    pub tasks: Vec<Task>,
}

impl LoadedWorkflow {
    pub fn status(&self) -> WorkflowStatus {
        let states: Vec<TaskState> = self.tasks.iter().map(|t| t.state).collect();
        WorkflowStatus::from_states(&states)
    }
}

/// A delta applied to a task atomically by [`WorkflowStore::update_task`].
#[derive(Debug, Clone)]
pub enum TaskDelta {
    Start,
    Block,
    Finish(TaskResult),
    Cancel,
}

/// Handle to the store actor. Cheap to clone; every call round-trips through
/// the actor's command channel.
#[derive(Clone)]
pub struct WorkflowStore {
    tx: mpsc::Sender<StoreCommand>,
}

impl WorkflowStore {
    /// Open the persistence root and spawn the owning actor.
    pub fn spawn(store_root: impl AsRef<Path>) -> Result<Self, StoreOpError> {
        let mut store = Store::open(store_root.as_ref()).map_err(|e| StoreOpError::Open(e.to_string()))?;

        let workflow_count = store
            .rebuild_indexes::<Workflow>()
            .map_err(|e| StoreOpError::Open(e.to_string()))?;
        let task_count = store
            .rebuild_indexes::<Task>()
            .map_err(|e| StoreOpError::Open(e.to_string()))?;
        info!(workflow_count, task_count, "workflow store indexes rebuilt");

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));

        Ok(Self { tx })
    }

    pub async fn create(&self, workflow: Workflow, tasks: Vec<Task>) -> StoreResponse<String> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Create { workflow, tasks, reply })
            .await
            .map_err(|_| StoreOpError::Channel)?;
        rx.await.map_err(|_| StoreOpError::Channel)?
    }

    pub async fn load(&self, workflow_id: &str) -> StoreResponse<Option<LoadedWorkflow>> {
        debug!(%workflow_id, "workflow_store: load");
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Load { workflow_id: workflow_id.to_string(), reply })
            .await
            .map_err(|_| StoreOpError::Channel)?;
        rx.await.map_err(|_| StoreOpError::Channel)?
    }

    pub async fn update_task(&self, workflow_id: &str, task_id: &str, delta: TaskDelta) -> StoreResponse<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::UpdateTask {
                workflow_id: workflow_id.to_string(),
                task_id: task_id.to_string(),
                delta,
                reply,
            })
            .await
            .map_err(|_| StoreOpError::Channel)?;
        rx.await.map_err(|_| StoreOpError::Channel)?
    }

    pub async fn status(&self, workflow_id: &str) -> StoreResponse<WorkflowStatus> {
        let loaded = self
            .load(workflow_id)
            .await?
            .ok_or_else(|| StoreOpError::NotFound(workflow_id.to_string()))?;
        Ok(loaded.status())
    }
}

async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!("workflow store actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::Create { workflow, tasks, reply } => {
                let result = (|| {
                    let id = store.create(workflow).map_err(|e| StoreOpError::Store(e.to_string()))?;
                    for task in tasks {
                        store.create(task).map_err(|e| StoreOpError::Store(e.to_string()))?;
                    }
                    Ok(id)
                })();
                let _ = reply.send(result);
            }

            StoreCommand::Load { workflow_id, reply } => {
                let result = load_workflow(&mut store, &workflow_id);
                let _ = reply.send(result);
            }

            StoreCommand::UpdateTask { workflow_id, task_id, delta, reply } => {
                let result = apply_delta(&mut store, &workflow_id, &task_id, delta);
                let _ = reply.send(result);
            }
        }
    }

    debug!("workflow store actor exiting");
}

fn load_workflow(store: &mut Store, workflow_id: &str) -> StoreResponse<Option<LoadedWorkflow>> {
    let workflow: Option<Workflow> = store.get(workflow_id).map_err(|e| StoreOpError::Store(e.to_string()))?;
    let Some(workflow) = workflow else {
        return Ok(None);
    };

    let filters = [Filter {
        field: "workflow_id".to_string(),
        op: FilterOp::Eq,
        value: IndexValue::String(workflow_id.to_string()),
    }];
    let mut tasks: Vec<Task> = store.list(&filters).map_err(|e| StoreOpError::Store(e.to_string()))?;

    // Present tasks in the workflow's presentation order (§3), not arbitrary index order.
    tasks.sort_by_key(|t| workflow.task_order.iter().position(|id| id == &t.id).unwrap_or(usize::MAX));

    Ok(Some(LoadedWorkflow { workflow, tasks }))
}

fn apply_delta(store: &mut Store, workflow_id: &str, task_id: &str, delta: TaskDelta) -> StoreResponse<()> {
    let mut task: Task = store
        .get(task_id)
        .map_err(|e| StoreOpError::Store(e.to_string()))?
        .ok_or_else(|| StoreOpError::NotFound(task_id.to_string()))?;

    if task.workflow_id != workflow_id {
        return Err(StoreOpError::NotFound(task_id.to_string()));
    }

    match delta {
        TaskDelta::Start => task.start(),
        TaskDelta::Block => task.block(),
        TaskDelta::Finish(result) => task.finish(result),
        TaskDelta::Cancel => task.cancel(),
    }

    store.update(task).map_err(|e| StoreOpError::Store(e.to_string()))
}
