//! An agentic task orchestration engine: classify a request, plan it into
//! typed subtasks when needed, execute under a dependency-and-concurrency
//! policy, and aggregate the result (§1).

pub mod aggregator;
pub mod capabilities;
pub mod classifier;
pub mod config;
pub mod dag;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod hybrid;
pub mod orchestrator;
pub mod planner;
pub mod workflow_store;

pub use config::Config;
pub use error::EngineError;
pub use orchestrator::Orchestrator;

/// Install a `tracing_subscriber::fmt` subscriber filtered by `log_level`,
/// falling back to `RUST_LOG`, falling back to `info` (§10.3).
pub fn setup_logging(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
