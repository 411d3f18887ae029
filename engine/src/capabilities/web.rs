//! The web browsing capability (§6): `Web.browse(query) -> {content, headlines, url, artifacts}`.

use async_trait::async_trait;

/// Artifacts a browse call may return; all fields are optional since a
/// failed or minimal browse may populate only a subset.
#[derive(Debug, Clone, Default)]
pub struct WebArtifacts {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub headlines: Vec<String>,
    pub content_preview: Option<String>,
    pub full_content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebResponse {
    pub success: bool,
    pub artifacts: WebArtifacts,
    pub error: Option<String>,
}

impl WebResponse {
    pub fn ok(artifacts: WebArtifacts) -> Self {
        Self {
            success: true,
            artifacts,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            artifacts: WebArtifacts::default(),
            error: Some(error.into()),
        }
    }
}

/// `Web.browse(request) -> W` (§1, §6). The core never fetches HTTP itself;
/// this trait is the entire surface it depends on.
#[async_trait]
pub trait Web: Send + Sync {
    async fn browse(&self, request: &str) -> WebResponse;
}

/// Deterministic mock for tests: replays scripted responses in order.
pub struct MockWeb {
    responses: std::sync::Mutex<std::collections::VecDeque<WebResponse>>,
}

impl MockWeb {
    pub fn new(responses: Vec<WebResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl Web for MockWeb {
    async fn browse(&self, _request: &str) -> WebResponse {
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .unwrap_or_else(|| WebResponse::failure("no more mock responses"))
    }
}
