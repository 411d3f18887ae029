//! `file_creation` handler (§4.5, §6): description, extracted filename, prior
//! artifacts for content -> `{filename, file_type, content_preview}`.

use serde_json::json;

use crate::domain::{Task, TaskResult};
use crate::extractor;

use super::DispatchContext;

pub async fn handle(task: &Task, prior_artifacts: &[&TaskResult], ctx: &DispatchContext) -> TaskResult {
    let extracted = extractor::extract(&task.description);

    let prior_content: String = prior_artifacts
        .iter()
        .filter_map(|a| a.artifacts.get("full_content").or_else(|| a.artifacts.get("content_preview")))
        .filter_map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = if prior_content.is_empty() {
        format!("Write the following as plain content, ready to save to a file: {}", task.description)
    } else {
        format!(
            "Using the following source material, write content satisfying this request: {}\n\n{}",
            task.description, prior_content
        )
    };

    let mut completion = crate::capabilities::CompletionRequest::new(prompt);
    completion.model = ctx.default_model.clone();

    let response = match ctx.llm.complete(completion).await {
        Ok(r) if r.success => r,
        Ok(r) => return TaskResult::failure(r.error.unwrap_or_else(|| "LLM call did not succeed".into())),
        Err(e) => return TaskResult::failure(e.to_string()),
    };

    let Some(content) = response.result else {
        return TaskResult::failure("LLM returned no content");
    };

    if let Err(e) = ctx.files.mkdir_p(&ctx.documents_dir).await {
        return TaskResult::failure(e.to_string());
    }

    let path = ctx.documents_dir.join(&extracted.filename);
    if let Err(e) = ctx.files.write(&path, content.as_bytes()).await {
        return TaskResult::failure(e.to_string());
    }

    TaskResult::ok(
        [
            ("filename".to_string(), json!(path.display().to_string())),
            ("file_type".to_string(), json!(extracted.content_type)),
            ("content_preview".to_string(), json!(preview(&content))),
        ]
        .into_iter()
        .collect(),
    )
}

fn preview(content: &str) -> String {
    content.chars().take(200).collect()
}
