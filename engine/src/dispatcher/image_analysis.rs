//! `image_analysis` handler (§4.5, §6): `image_path`, optional `prompt` ->
//! `{image_path, analysis}`.

use serde_json::json;

use crate::domain::{Task, TaskResult};

use super::DispatchContext;

pub async fn handle(task: &Task, ctx: &DispatchContext) -> TaskResult {
    let Some(image_path) = task.parameters.get("image_path").and_then(|v| v.as_str()) else {
        return TaskResult::failure("image_analysis task is missing parameters.image_path");
    };
    let prompt = task.parameters.get("prompt").and_then(|v| v.as_str());

    let response = ctx.vision.analyze(image_path, prompt).await;

    if !response.success {
        return TaskResult::failure(response.error.unwrap_or_else(|| "vision analysis failed".into()));
    }

    let Some(analysis) = response.analysis else {
        return TaskResult::failure("vision analysis returned no result");
    };

    TaskResult::ok(
        [
            ("image_path".to_string(), json!(image_path)),
            ("analysis".to_string(), json!(analysis)),
        ]
        .into_iter()
        .collect(),
    )
}
