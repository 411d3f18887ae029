//! Task: a unit of work within a [`super::workflow::Workflow`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use taskstore::{IndexValue, Record, now_ms};

use super::id::generate_id;
use super::task_result::TaskResult;

/// Selects the handler a task is dispatched to (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    FileCreation,
    WebBrowsing,
    ImageAnalysis,
    General,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::FileCreation => write!(f, "file_creation"),
            TaskType::WebBrowsing => write!(f, "web_browsing"),
            TaskType::ImageAnalysis => write!(f, "image_analysis"),
            TaskType::General => write!(f, "general"),
        }
    }
}

/// A task's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    Pending,
    InProgress,
    Blocked,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    /// Terminal states never leave themselves (I3).
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Cancelled)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::InProgress => write!(f, "in_progress"),
            TaskState::Blocked => write!(f, "blocked"),
            TaskState::Completed => write!(f, "completed"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A unit of work inside a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub workflow_id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub dependencies: Vec<String>,
    pub state: TaskState,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub parameters: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn new(workflow_id: impl Into<String>, description: impl Into<String>, task_type: TaskType) -> Self {
        let description = description.into();
        let now = now_ms();
        Self {
            id: generate_id("task", &description),
            workflow_id: workflow_id.into(),
            description,
            task_type,
            dependencies: Vec::new(),
            state: TaskState::Pending,
            result: None,
            parameters: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// I5: ready only when pending and every dependency is `completed`.
    pub fn is_ready(&self, completed: &HashSet<&str>) -> bool {
        self.state == TaskState::Pending && self.dependencies.iter().all(|d| completed.contains(d.as_str()))
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn start(&mut self) {
        self.state = TaskState::InProgress;
        self.updated_at = now_ms();
    }

    pub fn block(&mut self) {
        self.state = TaskState::Blocked;
        self.updated_at = now_ms();
    }

    /// Apply a terminal [`TaskResult`], honoring I4 (result co-presence).
    pub fn finish(&mut self, result: TaskResult) {
        self.state = if result.success { TaskState::Completed } else { TaskState::Failed };
        self.result = Some(result);
        self.updated_at = now_ms();
    }

    pub fn cancel(&mut self) {
        self.state = TaskState::Cancelled;
        self.result = Some(TaskResult::cancelled());
        self.updated_at = now_ms();
    }
}

impl Record for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("workflow_id".to_string(), IndexValue::String(self.workflow_id.clone()));
        fields.insert("state".to_string(), IndexValue::String(self.state.to_string()));
        fields.insert("type".to_string(), IndexValue::String(self.task_type.to_string()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_pending_with_no_result() {
        let task = Task::new("wf-1", "Write a poem", TaskType::FileCreation);
        assert_eq!(task.state, TaskState::Pending);
        assert!(task.result.is_none());
        assert!(task.id.contains("-task-"));
    }

    #[test]
    fn is_ready_requires_all_dependencies_completed() {
        let task = Task::new("wf-1", "Compile report", TaskType::General).with_dependencies(vec!["t1".into(), "t2".into()]);

        let mut completed = HashSet::new();
        completed.insert("t1");
        assert!(!task.is_ready(&completed));

        completed.insert("t2");
        assert!(task.is_ready(&completed));
    }

    #[test]
    fn finish_sets_state_from_result_success() {
        let mut task = Task::new("wf-1", "Browse web", TaskType::WebBrowsing);
        task.start();
        task.finish(TaskResult::failure("boom"));
        assert_eq!(task.state, TaskState::Failed);
        assert!(!task.result.as_ref().unwrap().success);
        assert!(task.is_terminal());
    }
}
