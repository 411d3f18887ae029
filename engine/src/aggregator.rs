//! C8: fold a finished workflow's tasks into one structured outcome (§4.8).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Task, TaskState};

/// The aggregator's reserved artifact key (§9): a handler's raw underlying
/// output, which must never reach `TaskResult.artifacts` in the first place.
const RESERVED_FULL_RESULT_KEY: &str = "full_result";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub success: bool,
    pub message: String,
    pub artifacts: HashMap<String, Value>,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

/// `aggregate(tasks) -> AggregatedResult` (§4.8).
pub fn aggregate(tasks: &[Task]) -> AggregatedResult {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.state == TaskState::Completed).count();
    let failed = tasks.iter().filter(|t| t.state == TaskState::Failed).count();

    let success = failed == 0 && completed > 0;

    let message = if total == 0 {
        "no tasks to run".to_string()
    } else if success && completed == total {
        format!("completed all {completed} task(s)")
    } else if completed > 0 && failed > 0 {
        format!("partial success: {completed} completed, {failed} failed, {total} total")
    } else {
        format!("failed: {failed} of {total} task(s) did not complete")
    };

    let mut artifacts = HashMap::new();
    for task in tasks {
        let Some(result) = &task.result else { continue };
        for (key, value) in &result.artifacts {
            if key == RESERVED_FULL_RESULT_KEY {
                continue;
            }
            artifacts.insert(format!("{}_{}", task.task_type, key), value.clone());
        }
    }

    AggregatedResult { success, message, artifacts, completed, failed, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskResult, TaskType};
    use serde_json::json;

    fn completed_task(task_type: TaskType, key: &str, value: Value) -> Task {
        let mut task = Task::new("wf", "desc", task_type);
        task.start();
        task.finish(TaskResult::ok([(key.to_string(), value)].into_iter().collect()));
        task
    }

    #[test]
    fn all_success_reports_success_with_namespaced_artifacts() {
        let tasks = vec![completed_task(TaskType::FileCreation, "filename", json!("poem.txt"))];
        let result = aggregate(&tasks);
        assert!(result.success);
        assert_eq!(result.completed, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(result.artifacts.get("file_creation_filename"), Some(&json!("poem.txt")));
    }

    #[test]
    fn partial_failure_is_not_success_but_keeps_completed_artifacts() {
        let mut failed_task = Task::new("wf", "desc", TaskType::WebBrowsing);
        failed_task.start();
        failed_task.finish(TaskResult::failure("boom"));

        let tasks = vec![completed_task(TaskType::FileCreation, "filename", json!("poem.txt")), failed_task];
        let result = aggregate(&tasks);
        assert!(!result.success);
        assert_eq!(result.completed, 1);
        assert_eq!(result.failed, 1);
        assert!(result.message.contains("partial"));
    }

    #[test]
    fn empty_workflow_is_not_success() {
        let result = aggregate(&[]);
        assert!(!result.success);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn reserved_full_result_key_is_never_surfaced() {
        let tasks = vec![completed_task(TaskType::General, RESERVED_FULL_RESULT_KEY, json!("raw internal blob"))];
        let result = aggregate(&tasks);
        assert!(result.artifacts.is_empty());
    }
}
