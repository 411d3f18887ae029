//! C9: wires C1-C8 together behind one entry point, `run_request` (§2).
//! The binary's `main` is a thin driver over this.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregator::{self, AggregatedResult};
use crate::capabilities::{Files, LlmClient, Vision, Web};
use crate::classifier::{Classifier, SignalSet};
use crate::config::Config;
use crate::dispatcher::{DispatchContext, Dispatcher};
use crate::domain::{Shape, Task, TaskType};
use crate::error::EngineError;
use crate::executor::Executor;
use crate::hybrid::HybridRunner;
use crate::planner::Planner;
use crate::workflow_store::{StoreOpError, WorkflowStore};

/// An ad hoc workflow id for single-shot shapes, which bypass the store (§3).
const ADHOC_WORKFLOW_ID: &str = "adhoc";

pub struct Orchestrator {
    classifier: Classifier,
    signals: SignalSet,
    planner: Planner,
    store: WorkflowStore,
    dispatcher: Dispatcher,
    executor: Executor,
    hybrid: HybridRunner,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        web: Arc<dyn Web>,
        vision: Arc<dyn Vision>,
        files: Arc<dyn Files>,
    ) -> Result<Self, EngineError> {
        let store = WorkflowStore::spawn(&config.store_root)?;

        let ctx = DispatchContext {
            llm: llm.clone(),
            web: web.clone(),
            vision: vision.clone(),
            files: files.clone(),
            documents_dir: config.documents_dir.clone(),
            default_model: config.default_model.clone(),
        };
        let dispatcher = Dispatcher::new(ctx);
        let task_timeout = config.task_timeout_seconds.map(Duration::from_secs);
        let executor = Executor::new(store.clone(), dispatcher.clone(), config.max_parallel_tasks, task_timeout);

        let planner = Planner::new(llm.clone(), config.default_model.clone());
        let hybrid = HybridRunner::new(llm, web, files, config.documents_dir.clone(), config.default_model.clone());

        Ok(Self {
            classifier: Classifier::default(),
            signals: SignalSet::default(),
            planner,
            store,
            dispatcher,
            executor,
            hybrid,
        })
    }

    /// `run_request(request) -> AggregatedResult` (§2).
    pub async fn run_request(&self, request: &str) -> Result<AggregatedResult, EngineError> {
        let shape = self.classifier.classify(request);
        info!(%shape, "classified request");

        match shape {
            Shape::DirectFile => Ok(self.run_direct_file(request).await),
            Shape::WebOnly => self.run_web_only(request).await,
            Shape::Hybrid => Ok(self.run_hybrid(request).await),
            Shape::Complex => self.run_complex(request).await,
        }
    }

    async fn run_direct_file(&self, request: &str) -> AggregatedResult {
        let mut task = Task::new(ADHOC_WORKFLOW_ID, request, TaskType::FileCreation);
        let result = self.dispatcher.dispatch(&task, &[]).await;
        task.finish(result);
        aggregator::aggregate(&[task])
    }

    /// §7's fallback chain: a failing `WebOnly` tries `Hybrid` when the
    /// request also carries a file-output signal, else routes to the
    /// planner when it looks complex enough to be worth decomposing.
    async fn run_web_only(&self, request: &str) -> Result<AggregatedResult, EngineError> {
        let mut task = Task::new(ADHOC_WORKFLOW_ID, request, TaskType::WebBrowsing);
        let result = self.dispatcher.dispatch(&task, &[]).await;

        if !result.success {
            let detected = self.signals.detect(request);
            if detected.has_file_output_signal {
                return Ok(self.run_hybrid(request).await);
            }
            if detected.is_complex {
                return self.run_complex(request).await;
            }
        }

        task.finish(result);
        Ok(aggregator::aggregate(&[task]))
    }

    async fn run_hybrid(&self, request: &str) -> AggregatedResult {
        let result = self.hybrid.run(request).await;
        let mut task = Task::new(ADHOC_WORKFLOW_ID, request, TaskType::FileCreation);
        task.finish(result);
        aggregator::aggregate(&[task])
    }

    async fn run_complex(&self, request: &str) -> Result<AggregatedResult, EngineError> {
        let planned = self.planner.plan(request).await?;
        let workflow_id = self.store.create(planned.workflow, planned.tasks).await?;

        self.executor.run(&workflow_id, CancellationToken::new(), None).await?;

        let loaded = self
            .store
            .load(&workflow_id)
            .await?
            .ok_or_else(|| EngineError::Store(StoreOpError::NotFound(workflow_id.clone())))?;

        Ok(aggregator::aggregate(&loaded.tasks))
    }
}
