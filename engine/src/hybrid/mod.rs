//! C7: the fast path for web -> file (§4.7). Two steps: browse, then
//! synthesize-and-write, with sentinel-delimited content preserved verbatim.

pub mod sentinel;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::capabilities::{CompletionRequest, Files, LlmClient, Web, WebArtifacts};
use crate::domain::TaskResult;
use crate::extractor;

pub struct HybridRunner {
    llm: Arc<dyn LlmClient>,
    web: Arc<dyn Web>,
    files: Arc<dyn Files>,
    documents_dir: PathBuf,
    default_model: Option<String>,
}

impl HybridRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        web: Arc<dyn Web>,
        files: Arc<dyn Files>,
        documents_dir: PathBuf,
        default_model: Option<String>,
    ) -> Self {
        Self { llm, web, files, documents_dir, default_model }
    }

    pub async fn run(&self, request: &str) -> TaskResult {
        let browse = self.web.browse(request).await;
        if !browse.success {
            info!("hybrid: browse failed, falling back to direct file creation");
            return self.direct_file_fallback(request).await;
        }

        let artifacts = browse.artifacts;
        let content = artifacts
            .full_content
            .clone()
            .unwrap_or_else(|| stitch(&artifacts));

        let (preserved, trimmed) = sentinel::extract(&content);

        let draft = if is_markdown_structured(&trimmed) {
            trimmed
        } else {
            match self.synthesize(request, &trimmed).await {
                Some(draft) => draft,
                None => {
                    warn!("hybrid: synthesis failed, falling back to direct file creation");
                    return self.direct_file_fallback(request).await;
                }
            }
        };

        let draft = match &preserved {
            Some(block) => sentinel::splice_preserved(&draft, block),
            None => draft,
        };
        let draft = append_sources(&draft, artifacts.url.as_deref(), preserved.as_deref());

        let extracted = extractor::extract(request);
        let path = self.documents_dir.join(&extracted.filename);

        if self.files.mkdir_p(&self.documents_dir).await.is_err() || self.files.write(&path, draft.as_bytes()).await.is_err() {
            warn!("hybrid: write failed, falling back to direct file creation");
            return self.direct_file_fallback(request).await;
        }

        TaskResult::ok(
            [
                ("filename".to_string(), json!(path.display().to_string())),
                ("content_preview".to_string(), json!(preview(&draft))),
                ("web_url".to_string(), json!(artifacts.url)),
                ("web_domain".to_string(), json!(artifacts.domain)),
            ]
            .into_iter()
            .collect(),
        )
    }

    async fn synthesize(&self, request: &str, browsed_content: &str) -> Option<String> {
        let prompt = format!(
            "Original request: {request}\n\n\
             Browsed content:\n{browsed_content}\n\n\
             Produce markdown with a title heading, section headings, and a \
             final `# Sources` list enumerating the actual URLs found above \
             (not just a search URL). If a \"Detailed Analysis from Top \
             Sources\" section exists in the browsed content, preserve it \
             verbatim."
        );
        let mut completion = CompletionRequest::new(prompt);
        completion.model = self.default_model.clone();

        match self.llm.complete(completion).await {
            Ok(r) if r.success => r.result,
            _ => None,
        }
    }

    /// DirectFile fallback (§7, §9): never re-enters a collaborator that just
    /// reported failure, so this touches only the LLM and Files.
    async fn direct_file_fallback(&self, request: &str) -> TaskResult {
        let mut completion = CompletionRequest::new(request);
        completion.model = self.default_model.clone();

        let response = match self.llm.complete(completion).await {
            Ok(r) if r.success => r,
            Ok(r) => return TaskResult::failure(r.error.unwrap_or_else(|| "LLM call did not succeed".into())),
            Err(e) => return TaskResult::failure(e.to_string()),
        };
        let Some(content) = response.result else {
            return TaskResult::failure("LLM returned no content");
        };

        let extracted = extractor::extract(request);
        if self.files.mkdir_p(&self.documents_dir).await.is_err() {
            return TaskResult::failure("failed to create documents directory");
        }
        let path = self.documents_dir.join(&extracted.filename);
        if self.files.write(&path, content.as_bytes()).await.is_err() {
            return TaskResult::failure("failed to write fallback file");
        }

        TaskResult::ok(
            [
                ("filename".to_string(), json!(path.display().to_string())),
                ("file_type".to_string(), json!(extracted.content_type)),
                ("content_preview".to_string(), json!(preview(&content))),
            ]
            .into_iter()
            .collect(),
        )
    }
}

fn stitch(artifacts: &WebArtifacts) -> String {
    let mut out = String::new();
    for headline in &artifacts.headlines {
        out.push_str("- ");
        out.push_str(headline);
        out.push('\n');
    }
    if let Some(preview) = &artifacts.content_preview {
        out.push('\n');
        out.push_str(preview);
    }
    if let Some(url) = &artifacts.url {
        out.push_str("\n\nSource: ");
        out.push_str(url);
    }
    out
}

fn is_markdown_structured(content: &str) -> bool {
    content.contains("# ") && content.contains("## ") && content.len() > 1000
}

fn preview(content: &str) -> String {
    content.chars().take(200).collect()
}

/// Build the final `Sources:` block (§9's pinned ambiguity resolution): the
/// main URL plus every URL found in the preserved block, order-preserving,
/// deduplicated against whatever the draft's own `# Sources` section lists.
fn append_sources(draft: &str, main_url: Option<&str>, preserved_block: Option<&str>) -> String {
    let already_listed: Vec<String> = match draft.find("# Sources") {
        Some(idx) => sentinel::find_urls(&draft[idx..]),
        None => Vec::new(),
    };

    let mut candidates: Vec<String> = Vec::new();
    if let Some(url) = main_url {
        candidates.push(url.to_string());
    }
    if let Some(block) = preserved_block {
        candidates.extend(sentinel::find_urls(block));
    }

    let mut seen: Vec<String> = already_listed;
    let mut fresh = Vec::new();
    for url in candidates {
        if !seen.contains(&url) {
            seen.push(url.clone());
            fresh.push(url);
        }
    }

    if fresh.is_empty() {
        draft.to_string()
    } else {
        let mut out = draft.to_string();
        out.push_str("\n\nSources:\n");
        for url in fresh {
            out.push_str("- ");
            out.push_str(&url);
            out.push('\n');
        }
        out
    }
}
