//! `web_browsing` handler (§4.5, §6): description (query) -> `{url, domain,
//! headlines[], content_preview, full_content}`.

use serde_json::json;

use crate::domain::{Task, TaskResult};

use super::DispatchContext;

pub async fn handle(task: &Task, ctx: &DispatchContext) -> TaskResult {
    let response = ctx.web.browse(&task.description).await;

    if !response.success {
        return TaskResult::failure(response.error.unwrap_or_else(|| "web browse failed".into()));
    }

    let artifacts = response.artifacts;
    let mut map = serde_json::Map::new();
    if let Some(url) = &artifacts.url {
        map.insert("url".to_string(), json!(url));
    }
    if let Some(domain) = &artifacts.domain {
        map.insert("domain".to_string(), json!(domain));
    }
    map.insert("headlines".to_string(), json!(artifacts.headlines));
    if let Some(preview) = &artifacts.content_preview {
        map.insert("content_preview".to_string(), json!(preview));
    }
    if let Some(full) = &artifacts.full_content {
        map.insert("full_content".to_string(), json!(full));
    }

    TaskResult::ok(map.into_iter().collect())
}
