use serde::{Deserialize, Serialize};

/// A request's classified shape, produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Create a file whose content the LLM generates in one shot.
    DirectFile,
    /// Fetch information; no file written.
    WebOnly,
    /// Fetch, then synthesize, then write exactly one file.
    Hybrid,
    /// Submit to the planner for a multi-step workflow.
    Complex,
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::DirectFile => write!(f, "direct_file"),
            Shape::WebOnly => write!(f, "web_only"),
            Shape::Hybrid => write!(f, "hybrid"),
            Shape::Complex => write!(f, "complex"),
        }
    }
}
