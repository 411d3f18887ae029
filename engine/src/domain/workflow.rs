//! Workflow: a dependency graph of tasks created from one user request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use taskstore::{IndexValue, Record, now_ms};

use super::id::generate_id;
use super::task::TaskState;

/// A workflow record. Task bodies live in the `tasks` collection; a workflow
/// only keeps their ids in presentation order (§3: "not the execution order").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub task_order: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Workflow {
    pub fn new(description: impl Into<String>) -> Self {
        let description = description.into();
        let now = now_ms();
        Self {
            id: generate_id("workflow", &description),
            description,
            task_order: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn push_task(&mut self, task_id: impl Into<String>) {
        self.task_order.push(task_id.into());
        self.updated_at = now_ms();
    }
}

impl Record for Workflow {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "workflows"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// A workflow's overall derived status (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Status counts over a workflow's tasks, satisfying P5 (counts sum to total).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub progress_pct: u32,
    pub overall: OverallStatus,
}

impl WorkflowStatus {
    /// Derive status from a workflow's task states (§4.4's `overall` rule).
    pub fn from_states(states: &[TaskState]) -> Self {
        let total = states.len();
        let mut pending = 0;
        let mut in_progress = 0;
        let mut blocked = 0;
        let mut completed = 0;
        let mut failed = 0;
        let mut cancelled = 0;

        for state in states {
            match state {
                TaskState::Pending => pending += 1,
                TaskState::InProgress => in_progress += 1,
                TaskState::Blocked => blocked += 1,
                TaskState::Completed => completed += 1,
                TaskState::Failed => failed += 1,
                TaskState::Cancelled => cancelled += 1,
            }
        }

        let overall = if total == 0 {
            OverallStatus::Pending
        } else if completed == total {
            OverallStatus::Completed
        } else if failed > 0 && in_progress == 0 {
            OverallStatus::Failed
        } else if in_progress > 0 {
            OverallStatus::Running
        } else {
            OverallStatus::Pending
        };

        let progress_pct = if total == 0 { 0 } else { (completed * 100 / total) as u32 };

        Self {
            total,
            pending,
            in_progress,
            blocked,
            completed,
            failed,
            cancelled,
            progress_pct,
            overall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_workflow_is_pending_with_zero_progress() {
        let status = WorkflowStatus::from_states(&[]);
        assert_eq!(status.overall, OverallStatus::Pending);
        assert_eq!(status.progress_pct, 0);
    }

    #[test]
    fn all_completed_is_completed_overall() {
        let status = WorkflowStatus::from_states(&[TaskState::Completed, TaskState::Completed]);
        assert_eq!(status.overall, OverallStatus::Completed);
        assert_eq!(status.progress_pct, 100);
    }

    #[test]
    fn failed_with_no_in_progress_is_failed_overall() {
        let status = WorkflowStatus::from_states(&[TaskState::Failed, TaskState::Blocked]);
        assert_eq!(status.overall, OverallStatus::Failed);
    }

    #[test]
    fn counts_sum_to_total() {
        let states = [
            TaskState::Pending,
            TaskState::InProgress,
            TaskState::Blocked,
            TaskState::Completed,
            TaskState::Failed,
            TaskState::Cancelled,
        ];
        let status = WorkflowStatus::from_states(&states);
        assert_eq!(
            status.pending + status.in_progress + status.blocked + status.completed + status.failed + status.cancelled,
            status.total
        );
    }
}
