//! Thin binary driver over [`agentforge::Orchestrator`]. CLI parsing, model
//! inventory, and chat history are explicitly out of scope for the core;
//! this reads one request from the command line and prints the aggregated
//! result as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use agentforge::capabilities::{LocalFilesystem, MockLlmClient, MockVision, MockWeb};
use agentforge::{Config, Orchestrator};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load(None) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    agentforge::setup_logging(&config.log_level);

    let request = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if request.is_empty() {
        eprintln!("usage: agentforge <request text>");
        return ExitCode::FAILURE;
    }

    // Production deployments supply real `LlmClient`/`Web`/`Vision`
    // implementations here; the core names no concrete provider (§1). This
    // driver wires the one real collaborator (the filesystem) and leaves the
    // others as empty mocks, so a request routed to them fails cleanly.
    let llm = Arc::new(MockLlmClient::new(Vec::new()));
    let web = Arc::new(MockWeb::new(Vec::new()));
    let vision = Arc::new(MockVision::new(Vec::new()));
    let files = Arc::new(LocalFilesystem);

    let orchestrator = match Orchestrator::new(&config, llm, web, vision, files) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            eprintln!("failed to start orchestrator: {e}");
            return ExitCode::FAILURE;
        }
    };

    match orchestrator.run_request(&request).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
            if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("request failed: {e}");
            ExitCode::FAILURE
        }
    }
}
