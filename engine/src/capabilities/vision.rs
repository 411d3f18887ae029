//! The image analysis capability (§6): `Vision.analyze(path, prompt) -> text`.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub success: bool,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

impl VisionResponse {
    pub fn ok(analysis: impl Into<String>) -> Self {
        Self {
            success: true,
            analysis: Some(analysis.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Vision: Send + Sync {
    async fn analyze(&self, path: &str, prompt: Option<&str>) -> VisionResponse;
}

/// Deterministic mock for tests: replays scripted responses in order.
pub struct MockVision {
    responses: std::sync::Mutex<std::collections::VecDeque<VisionResponse>>,
}

impl MockVision {
    pub fn new(responses: Vec<VisionResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl Vision for MockVision {
    async fn analyze(&self, _path: &str, _prompt: Option<&str>) -> VisionResponse {
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .unwrap_or_else(|| VisionResponse::failure("no more mock responses"))
    }
}
