//! `general` handler (§4.5, §6): description -> free-form `{message}`.

use serde_json::json;

use crate::domain::{Task, TaskResult};

use super::DispatchContext;

pub async fn handle(task: &Task, ctx: &DispatchContext) -> TaskResult {
    let mut completion = crate::capabilities::CompletionRequest::new(&task.description);
    completion.model = ctx.default_model.clone();

    match ctx.llm.complete(completion).await {
        Ok(r) if r.success => {
            let message = r.result.unwrap_or_default();
            TaskResult::ok([("message".to_string(), json!(message))].into_iter().collect())
        }
        Ok(r) => TaskResult::failure(r.error.unwrap_or_else(|| "general task failed".into())),
        Err(e) => TaskResult::failure(e.to_string()),
    }
}
