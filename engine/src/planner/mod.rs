//! C3: decompose a request into a [`Workflow`] of typed [`Task`]s (§4.3).

mod error;

pub use error::PlannerError;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capabilities::{CompletionRequest, LlmClient, ToolDefinition};
use crate::dag;
use crate::domain::{Task, TaskType, Workflow};

/// LLM output schema for one planned step.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepOutput {
    title: String,
    description: String,
    #[serde(rename = "type")]
    task_type: TaskType,
    #[serde(default)]
    depends_on: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlanOutput {
    steps: Vec<StepOutput>,
}

/// The planner's decomposition result: the workflow plus any non-fatal
/// warnings accumulated while resolving dependencies (§4.3).
#[derive(Debug, Clone)]
pub struct PlannedWorkflow {
    pub workflow: Workflow,
    pub tasks: Vec<Task>,
    pub warnings: Vec<String>,
}

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    default_model: Option<String>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, default_model: Option<String>) -> Self {
        Self { llm, default_model }
    }

    /// `plan(request) -> workflow_id`, returning the full workflow and task set.
    pub async fn plan(&self, request: &str) -> Result<PlannedWorkflow, PlannerError> {
        let output = self.get_plan(request).await?;
        if output.steps.is_empty() {
            return Err(PlannerError::EmptyPlan);
        }

        let workflow = Workflow::new(request);
        let (tasks, warnings) = build_tasks(&workflow.id, &output);

        let edges: HashMap<String, Vec<String>> = tasks
            .iter()
            .map(|t| (t.id.clone(), t.dependencies.clone()))
            .collect();
        dag::validate(&edges).map_err(|e| PlannerError::InvalidGraph { path: e.path })?;

        let mut workflow = workflow;
        for task in &tasks {
            workflow.push_task(&task.id);
        }

        info!(task_count = tasks.len(), warning_count = warnings.len(), "planned workflow");

        Ok(PlannedWorkflow { workflow, tasks, warnings })
    }

    async fn get_plan(&self, request: &str) -> Result<PlanOutput, PlannerError> {
        let mut completion_request = CompletionRequest::new(build_prompt(request))
            .with_system_prompt(SYSTEM_PROMPT)
            .with_tools(vec![submit_plan_tool()]);
        completion_request.model = self.default_model.clone();

        let response = self
            .llm
            .complete(completion_request)
            .await
            .map_err(|e| PlannerError::Llm(e.to_string()))?;

        if !response.success {
            return Err(PlannerError::Llm(response.error.unwrap_or_else(|| "unknown LLM error".into())));
        }

        parse_plan_response(&response.tool_calls, response.result.as_deref())
    }
}

fn build_prompt(request: &str) -> String {
    format!("Decompose this request into an ordered list of subtasks:\n\n{request}")
}

const SYSTEM_PROMPT: &str = "You are a planner that decomposes a complex request into an ordered list of \
typed subtasks with explicit dependencies. Each step has a title, a description, a task type \
(file_creation, web_browsing, image_analysis, or general), and a list of the titles of other \
steps it depends on. A step may only depend on steps that appear earlier in the list. \
Call submit_plan once with all steps.";

fn submit_plan_tool() -> ToolDefinition {
    ToolDefinition::new(
        "submit_plan",
        "Submit the request decomposition. Call this once with all steps.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "type": {
                                "type": "string",
                                "enum": ["file_creation", "web_browsing", "image_analysis", "general"]
                            },
                            "depends_on": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Titles of earlier steps this step depends on"
                            }
                        },
                        "required": ["title", "description", "type"]
                    }
                }
            },
            "required": ["steps"]
        }),
    )
}

fn parse_plan_response(tool_calls: &[crate::capabilities::ToolCall], content: Option<&str>) -> Result<PlanOutput, PlannerError> {
    for call in tool_calls {
        if call.name == "submit_plan" {
            return serde_json::from_value(call.input.clone())
                .map_err(|e| PlannerError::MalformedOutput(e.to_string()));
        }
    }

    if let Some(content) = content
        && let Ok(output) = serde_json::from_str::<PlanOutput>(content)
    {
        return Ok(output);
    }

    Err(PlannerError::MalformedOutput("no submit_plan tool call and content is not a valid plan".into()))
}

/// Two-pass dependency resolution (§4.3): title -> id map, then resolve.
fn build_tasks(workflow_id: &str, output: &PlanOutput) -> (Vec<Task>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut title_to_id: HashMap<&str, String> = HashMap::new();

    let mut tasks: Vec<Task> = output
        .steps
        .iter()
        .map(|step| {
            let task = Task::new(workflow_id, &step.description, step.task_type);
            title_to_id.insert(step.title.as_str(), task.id.clone());
            task
        })
        .collect();

    for (idx, step) in output.steps.iter().enumerate() {
        let mut dep_ids = Vec::new();
        for dep_title in &step.depends_on {
            match title_to_id.get(dep_title.as_str()) {
                Some(id) => dep_ids.push(id.clone()),
                None => warnings.push(format!("step '{}' depends on unknown step '{dep_title}'", step.title)),
            }
        }
        tasks[idx].dependencies = dep_ids;
    }

    (tasks, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CompletionResponse, MockLlmClient};

    fn tool_call_response(steps_json: serde_json::Value) -> CompletionResponse {
        CompletionResponse::tool_call("submit_plan", serde_json::json!({ "steps": steps_json }))
    }

    #[tokio::test]
    async fn plans_a_three_step_diamond() {
        let response = tool_call_response(serde_json::json!([
            { "title": "Research", "description": "research AI papers", "type": "web_browsing", "depends_on": [] },
            { "title": "Images", "description": "find images", "type": "web_browsing", "depends_on": [] },
            { "title": "Report", "description": "compile report", "type": "file_creation", "depends_on": ["Research", "Images"] },
        ]));
        let llm = Arc::new(MockLlmClient::new(vec![response]));
        let planner = Planner::new(llm, None);

        let planned = planner.plan("research and compile a report").await.unwrap();
        assert_eq!(planned.tasks.len(), 3);
        assert!(planned.warnings.is_empty());
        let report = planned.tasks.iter().find(|t| t.description == "compile report").unwrap();
        assert_eq!(report.dependencies.len(), 2);
    }

    #[tokio::test]
    async fn warns_on_unresolvable_dependency_title() {
        let response = tool_call_response(serde_json::json!([
            { "title": "A", "description": "a", "type": "general", "depends_on": ["ghost"] },
        ]));
        let llm = Arc::new(MockLlmClient::new(vec![response]));
        let planner = Planner::new(llm, None);

        let planned = planner.plan("do a").await.unwrap();
        assert_eq!(planned.warnings.len(), 1);
        assert!(planned.tasks[0].dependencies.is_empty());
    }

    #[tokio::test]
    async fn rejects_a_cyclic_plan() {
        let response = tool_call_response(serde_json::json!([
            { "title": "A", "description": "a", "type": "general", "depends_on": ["B"] },
            { "title": "B", "description": "b", "type": "general", "depends_on": ["A"] },
        ]));
        let llm = Arc::new(MockLlmClient::new(vec![response]));
        let planner = Planner::new(llm, None);

        let err = planner.plan("cyclic").await.unwrap_err();
        assert!(matches!(err, PlannerError::InvalidGraph { .. }));
    }

    #[tokio::test]
    async fn rejects_an_empty_plan() {
        let response = tool_call_response(serde_json::json!([]));
        let llm = Arc::new(MockLlmClient::new(vec![response]));
        let planner = Planner::new(llm, None);

        let err = planner.plan("nothing to do").await.unwrap_err();
        assert!(matches!(err, PlannerError::EmptyPlan));
    }
}
