//! C6: ready-set scheduler (§4.6). Cooperative, single workflow at a time;
//! up to `P` tasks run concurrently under a counting semaphore.

mod error;

pub use error::ExecutorError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dag;
use crate::dispatcher::Dispatcher;
use crate::domain::{Task, TaskResult, TaskState, WorkflowStatus};
use crate::workflow_store::{TaskDelta, WorkflowStore};

/// A progress snapshot, pushed after every state change (§4.6).
pub type ProgressCallback = Arc<dyn Fn(WorkflowStatus) + Send + Sync>;

pub struct Executor {
    store: WorkflowStore,
    dispatcher: Dispatcher,
    max_parallel: usize,
    task_timeout: Option<Duration>,
}

impl Executor {
    pub fn new(store: WorkflowStore, dispatcher: Dispatcher, max_parallel: usize, task_timeout: Option<Duration>) -> Self {
        Self {
            store,
            dispatcher,
            max_parallel: max_parallel.max(1),
            task_timeout,
        }
    }

    /// Run a workflow to completion, honoring `cancel` cooperatively.
    ///
    /// Step 1 (load + validate I1/I2) happens here rather than at plan time
    /// only, since a store crash could in principle leave a workflow with a
    /// task whose dependency was never persisted.
    pub async fn run(
        &self,
        workflow_id: &str,
        cancel: CancellationToken,
        progress: Option<ProgressCallback>,
    ) -> Result<WorkflowStatus, ExecutorError> {
        info!(%workflow_id, "executor: run");
        let loaded = self
            .store
            .load(workflow_id)
            .await
            .map_err(|e| ExecutorError::Store(e.to_string()))?
            .ok_or_else(|| ExecutorError::NotFound(workflow_id.to_string()))?;

        if loaded.tasks.iter().all(|t| t.is_terminal()) {
            // L2: running an already-completed (or otherwise fully terminal) workflow is a no-op.
            return Ok(loaded.status());
        }

        let edges: HashMap<String, Vec<String>> = loaded
            .tasks
            .iter()
            .map(|t| (t.id.clone(), t.dependencies.clone()))
            .collect();
        dag::validate(&edges).map_err(|e| ExecutorError::InvalidGraph { path: e.path })?;

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let (done_tx, mut done_rx) = tokio::sync::mpsc::channel::<(String, TaskResult)>(self.max_parallel.max(1) * 2);

        let mut states: HashMap<String, TaskState> = loaded.tasks.iter().map(|t| (t.id.clone(), t.state)).collect();
        let order: Vec<String> = loaded.tasks.iter().map(|t| t.id.clone()).collect();
        let by_id: HashMap<String, Task> = loaded.tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        let mut results: HashMap<String, TaskResult> = HashMap::new();

        let mut in_flight: usize = 0;

        loop {
            if states.values().all(|s| s.is_terminal()) {
                break;
            }

            if cancel.is_cancelled() {
                self.cancel_pending(workflow_id, &order, &mut states).await?;
                break;
            }

            let ready: Vec<String> = ready_set(&order, &by_id, &states);

            if ready.is_empty() && in_flight == 0 {
                self.block_remaining(workflow_id, &order, &mut states).await?;
                break;
            }

            let slots = self.max_parallel.saturating_sub(in_flight);
            for task_id in ready.into_iter().take(slots) {
                let task = by_id[&task_id].clone();
                self.store
                    .update_task(workflow_id, &task_id, TaskDelta::Start)
                    .await
                    .map_err(|e| ExecutorError::Store(e.to_string()))?;
                states.insert(task_id.clone(), TaskState::InProgress);
                in_flight += 1;

                let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                let prior: Vec<TaskResult> = task
                    .dependencies
                    .iter()
                    .filter_map(|d| results.get(d))
                    .cloned()
                    .collect();
                let dispatcher_result = self.dispatch_one(task, prior, cancel.clone(), done_tx.clone(), permit);
                tokio::spawn(dispatcher_result);
            }

            if let Some((task_id, result)) = done_rx.recv().await {
                self.store
                    .update_task(workflow_id, &task_id, TaskDelta::Finish(result.clone()))
                    .await
                    .map_err(|e| ExecutorError::Store(e.to_string()))?;
                states.insert(task_id.clone(), if result.success { TaskState::Completed } else { TaskState::Failed });
                results.insert(task_id, result);
                in_flight -= 1;

                if let Some(cb) = &progress {
                    let status = WorkflowStatus::from_states(&states.values().copied().collect::<Vec<_>>());
                    cb(status);
                }
            }
        }

        let final_states: Vec<TaskState> = states.values().copied().collect();
        Ok(WorkflowStatus::from_states(&final_states))
    }

    fn dispatch_one(
        &self,
        task: Task,
        prior: Vec<TaskResult>,
        cancel: CancellationToken,
        done_tx: tokio::sync::mpsc::Sender<(String, TaskResult)>,
        permit: tokio::sync::OwnedSemaphorePermit,
    ) -> impl std::future::Future<Output = ()> + Send + 'static {
        let dispatcher = self.dispatcher.clone();
        let timeout = self.task_timeout;

        async move {
            let _permit = permit;
            let prior_refs: Vec<&TaskResult> = prior.iter().collect();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => TaskResult::cancelled(),
                result = run_with_timeout(&dispatcher, &task, &prior_refs, timeout) => result,
            };

            let _ = done_tx.send((task.id.clone(), result)).await;
        }
    }

    async fn cancel_pending(
        &self,
        workflow_id: &str,
        order: &[String],
        states: &mut HashMap<String, TaskState>,
    ) -> Result<(), ExecutorError> {
        for task_id in order {
            let state = states[task_id];
            if !state.is_terminal() {
                self.store
                    .update_task(workflow_id, task_id, TaskDelta::Cancel)
                    .await
                    .map_err(|e| ExecutorError::Store(e.to_string()))?;
                states.insert(task_id.clone(), TaskState::Cancelled);
            }
        }
        Ok(())
    }

    /// Deadlock due to upstream failure (§4.6 step 3a): remaining pending
    /// tasks can never become ready, so they transition to `blocked`.
    async fn block_remaining(
        &self,
        workflow_id: &str,
        order: &[String],
        states: &mut HashMap<String, TaskState>,
    ) -> Result<(), ExecutorError> {
        for task_id in order {
            if states[task_id] == TaskState::Pending {
                self.store
                    .update_task(workflow_id, task_id, TaskDelta::Block)
                    .await
                    .map_err(|e| ExecutorError::Store(e.to_string()))?;
                states.insert(task_id.clone(), TaskState::Blocked);
                warn!(task_id, "blocked: a dependency failed upstream");
            }
        }
        Ok(())
    }
}

async fn run_with_timeout(
    dispatcher: &Dispatcher,
    task: &Task,
    prior: &[&TaskResult],
    timeout: Option<Duration>,
) -> TaskResult {
    match timeout {
        Some(d) => match tokio::time::timeout(d, dispatcher.dispatch(task, prior)).await {
            Ok(result) => result,
            Err(_) => TaskResult::failure("timeout: task exceeded its deadline"),
        },
        None => dispatcher.dispatch(task, prior).await,
    }
}

/// Ready set (§4.6 step 2): pending tasks whose dependencies are all
/// completed, oldest-insertion-order first as tie-break.
fn ready_set(order: &[String], by_id: &HashMap<String, Task>, states: &HashMap<String, TaskState>) -> Vec<String> {
    let completed: std::collections::HashSet<&str> = states
        .iter()
        .filter(|(_, s)| **s == TaskState::Completed)
        .map(|(id, _)| id.as_str())
        .collect();

    order
        .iter()
        .filter(|id| {
            states.get(id.as_str()) == Some(&TaskState::Pending) && by_id[id.as_str()].is_ready(&completed)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CompletionResponse, MockFiles, MockLlmClient, MockVision, MockWeb};
    use crate::dispatcher::DispatchContext;
    use crate::domain::{TaskType, Workflow};
    use std::path::PathBuf;

    fn ctx_with(responses: Vec<CompletionResponse>) -> DispatchContext {
        DispatchContext {
            llm: Arc::new(MockLlmClient::new(responses)),
            web: Arc::new(MockWeb::new(vec![])),
            vision: Arc::new(MockVision::new(vec![])),
            files: Arc::new(MockFiles::new()),
            documents_dir: PathBuf::from("/tmp/docs"),
            default_model: None,
        }
    }

    async fn spawn_store() -> WorkflowStore {
        let dir = tempfile::tempdir().unwrap().keep();
        WorkflowStore::spawn(dir).unwrap()
    }

    #[tokio::test]
    async fn diamond_dependency_completes_with_p2() {
        let store = spawn_store().await;
        let mut workflow = Workflow::new("diamond");
        let a = Task::new(&workflow.id, "a", TaskType::General);
        let b = Task::new(&workflow.id, "b", TaskType::General).with_dependencies(vec![a.id.clone()]);
        let c = Task::new(&workflow.id, "c", TaskType::General).with_dependencies(vec![a.id.clone()]);
        let d = Task::new(&workflow.id, "d", TaskType::General).with_dependencies(vec![b.id.clone(), c.id.clone()]);
        for t in [&a, &b, &c, &d] {
            workflow.push_task(&t.id);
        }
        let id = store
            .create(workflow, vec![a.clone(), b.clone(), c.clone(), d.clone()])
            .await
            .unwrap();

        let responses = (0..4).map(|_| CompletionResponse::text("ok")).collect();
        let dispatcher = Dispatcher::new(ctx_with(responses));
        let executor = Executor::new(store.clone(), dispatcher, 2, None);

        let status = executor.run(&id, CancellationToken::new(), None).await.unwrap();
        assert_eq!(status.completed, 4);
        assert_eq!(status.overall, crate::domain::OverallStatus::Completed);
    }

    #[tokio::test]
    async fn failed_dependency_blocks_its_dependent() {
        let store = spawn_store().await;
        let mut workflow = Workflow::new("t1 fails, t2 blocked");
        let t1 = Task::new(&workflow.id, "t1", TaskType::WebBrowsing);
        let t2 = Task::new(&workflow.id, "t2", TaskType::FileCreation).with_dependencies(vec![t1.id.clone()]);
        workflow.push_task(&t1.id);
        workflow.push_task(&t2.id);
        let id = store.create(workflow, vec![t1.clone(), t2.clone()]).await.unwrap();

        let ctx = DispatchContext {
            llm: Arc::new(MockLlmClient::new(vec![])),
            web: Arc::new(MockWeb::new(vec![crate::capabilities::WebResponse::failure("boom")])),
            vision: Arc::new(MockVision::new(vec![])),
            files: Arc::new(MockFiles::new()),
            documents_dir: PathBuf::from("/tmp/docs"),
            default_model: None,
        };
        let dispatcher = Dispatcher::new(ctx);
        let executor = Executor::new(store.clone(), dispatcher, 1, None);

        let status = executor.run(&id, CancellationToken::new(), None).await.unwrap();
        assert_eq!(status.failed, 1);
        assert_eq!(status.blocked, 1);
        assert_eq!(status.overall, crate::domain::OverallStatus::Failed);
    }

    #[tokio::test]
    async fn empty_workflow_is_a_no_op() {
        let store = spawn_store().await;
        let workflow = Workflow::new("empty");
        let id = store.create(workflow, vec![]).await.unwrap();

        let dispatcher = Dispatcher::new(ctx_with(vec![]));
        let executor = Executor::new(store.clone(), dispatcher, 1, None);

        let status = executor.run(&id, CancellationToken::new(), None).await.unwrap();
        assert_eq!(status.total, 0);
        assert_eq!(status.overall, crate::domain::OverallStatus::Pending);
    }
}
