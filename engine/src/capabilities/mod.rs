//! External collaborators: narrow capability interfaces, not concrete clients (§9).

pub mod files;
pub mod llm;
pub mod vision;
pub mod web;

pub use files::{Files, FilesError, LocalFilesystem, MockFiles};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, MockLlmClient, ToolCall, ToolDefinition};
pub use vision::{MockVision, Vision, VisionResponse};
pub use web::{MockWeb, Web, WebArtifacts, WebResponse};
