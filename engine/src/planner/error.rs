use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner LLM call failed: {0}")]
    Llm(String),

    #[error("planner produced malformed output: {0}")]
    MalformedOutput(String),

    #[error("planner produced zero steps")]
    EmptyPlan,

    #[error("planner produced an invalid dependency graph: {}", path.join(" -> "))]
    InvalidGraph { path: Vec<String> },
}
