//! C5: route a task to its handler by `task.type`, normalizing handler
//! output into a [`TaskResult`] (§4.5).

mod file_creation;
mod general;
mod image_analysis;
mod web_browsing;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::capabilities::{Files, LlmClient, Vision, Web};
use crate::domain::{Task, TaskResult, TaskType};

/// Collaborators and configuration every handler needs.
#[derive(Clone)]
pub struct DispatchContext {
    pub llm: Arc<dyn LlmClient>,
    pub web: Arc<dyn Web>,
    pub vision: Arc<dyn Vision>,
    pub files: Arc<dyn Files>,
    pub documents_dir: PathBuf,
    pub default_model: Option<String>,
}

#[derive(Clone)]
pub struct Dispatcher {
    ctx: DispatchContext,
}

impl Dispatcher {
    pub fn new(ctx: DispatchContext) -> Self {
        Self { ctx }
    }

    /// `dispatch(task, ctx) -> TaskResult` (§4.5). Handlers are deterministic
    /// with respect to state transitions and never retry internally. Every
    /// failure a handler can hit — a malformed task, a collaborator error —
    /// is normalized into `TaskResult::failure`, never propagated as an `Err`.
    pub async fn dispatch(&self, task: &Task, prior_artifacts: &[&TaskResult]) -> TaskResult {
        debug!(task_id = %task.id, task_type = %task.task_type, "dispatching task");
        match task.task_type {
            TaskType::FileCreation => file_creation::handle(task, prior_artifacts, &self.ctx).await,
            TaskType::WebBrowsing => web_browsing::handle(task, &self.ctx).await,
            TaskType::ImageAnalysis => image_analysis::handle(task, &self.ctx).await,
            TaskType::General => general::handle(task, &self.ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CompletionResponse, MockFiles, MockLlmClient, MockVision, MockWeb, WebResponse};
    use crate::domain::TaskType;

    fn test_ctx() -> DispatchContext {
        DispatchContext {
            llm: Arc::new(MockLlmClient::new(vec![CompletionResponse::text("a poem about autumn")])),
            web: Arc::new(MockWeb::new(vec![WebResponse::ok(Default::default())])),
            vision: Arc::new(MockVision::new(vec![])),
            files: Arc::new(MockFiles::new()),
            documents_dir: PathBuf::from("/tmp/docs"),
            default_model: None,
        }
    }

    #[tokio::test]
    async fn routes_file_creation_to_its_handler() {
        let dispatcher = Dispatcher::new(test_ctx());
        let task = Task::new("wf", "Create a poem about autumn and save it as autumn_poem.txt", TaskType::FileCreation);
        let result = dispatcher.dispatch(&task, &[]).await;
        assert!(result.success);
        assert!(result.artifacts.contains_key("filename"));
    }

    #[tokio::test]
    async fn routes_general_to_its_handler() {
        let dispatcher = Dispatcher::new(test_ctx());
        let task = Task::new("wf", "say hello", TaskType::General);
        let result = dispatcher.dispatch(&task, &[]).await;
        assert!(result.success);
        assert!(result.artifacts.contains_key("message"));
    }
}
