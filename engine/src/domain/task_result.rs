use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The outcome of one dispatched task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub artifacts: HashMap<String, Value>,
}

impl TaskResult {
    pub fn ok(artifacts: HashMap<String, Value>) -> Self {
        Self {
            success: true,
            error: None,
            artifacts,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            artifacts: HashMap::new(),
        }
    }

    pub fn cancelled() -> Self {
        Self::failure("cancelled")
    }
}
