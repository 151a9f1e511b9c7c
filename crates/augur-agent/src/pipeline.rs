use std::sync::Arc;
use std::time::Duration;

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use augur_core::config::AppConfig;
use augur_core::error::{AugurError, Result};
use augur_core::event::EventSink;
use augur_core::traits::{LlmClient, Retriever};
use augur_core::types::StreamEvent;

use crate::graph::{ExecutionResult, GraphExecutor};
use crate::stages::grade::{grader_from_config, DocumentGrader};
use crate::stages::PipelineDeps;
use crate::state::PipelineState;

/// Answer used by the sync path when the run produced no text.
pub const EMPTY_RESPONSE: &str = "No response generated";

/// The request orchestrator. Cheap to clone; every run gets its own state.
#[derive(Clone)]
pub struct Pipeline {
    deps: Arc<PipelineDeps>,
    executor: Arc<GraphExecutor>,
}

impl Pipeline {
    pub fn new(config: &AppConfig, llm: Arc<dyn LlmClient>, retriever: Arc<dyn Retriever>) -> Self {
        let executor = GraphExecutor::pipeline(
            config.pipeline.routing,
            config.pipeline.max_stage_visits,
        );
        Self {
            deps: Arc::new(PipelineDeps {
                llm,
                retriever,
                grader: grader_from_config(&config.pipeline),
                model: config.model.clone(),
                pipeline: config.pipeline.clone(),
            }),
            executor: Arc::new(executor),
        }
    }

    /// Replace the configured document grader.
    pub fn with_grader(self, grader: Arc<dyn DocumentGrader>) -> Self {
        let deps = PipelineDeps {
            llm: self.deps.llm.clone(),
            retriever: self.deps.retriever.clone(),
            grader,
            model: self.deps.model.clone(),
            pipeline: self.deps.pipeline.clone(),
        };
        Self {
            deps: Arc::new(deps),
            executor: self.executor,
        }
    }

    fn timeout_secs(&self) -> u64 {
        self.deps.pipeline.request_timeout_secs
    }

    /// Run one request to completion, publishing progress to `sink`.
    pub async fn run(&self, question: &str, sink: &EventSink) -> Result<ExecutionResult> {
        let secs = self.timeout_secs();
        let state = PipelineState::new(question);
        info!(question = %question, "Pipeline run started");

        let result = tokio::time::timeout(
            Duration::from_secs(secs),
            self.executor.execute(&self.deps, state, sink),
        )
        .await
        .map_err(|_| AugurError::Timeout(secs))??;

        info!(
            stages = result.trace.len(),
            refinements = result.state.refinements,
            elapsed_ms = result.elapsed_ms,
            "Pipeline run finished"
        );
        Ok(result)
    }

    /// Run without streaming and return the final state.
    pub async fn invoke(&self, question: &str) -> Result<PipelineState> {
        Ok(self.run(question, &EventSink::discard()).await?.state)
    }

    /// The sync answer. A timeout is turned into a message for the user;
    /// other errors are returned.
    pub async fn respond(&self, question: &str) -> Result<String> {
        match self.invoke(question).await {
            Ok(state) if state.generation.is_empty() => Ok(EMPTY_RESPONSE.to_string()),
            Ok(state) => Ok(state.generation),
            Err(AugurError::Timeout(secs)) => {
                warn!(secs, "Request timed out");
                Ok(timeout_message(secs))
            }
            Err(e) => Err(e),
        }
    }

    /// Run in a background task and stream its events. The stream always
    /// ends with exactly one `done` or `error` event.
    pub fn stream(&self, question: &str) -> ReceiverStream<StreamEvent> {
        let (sink, rx) = EventSink::channel(self.deps.pipeline.event_buffer.max(1));
        let pipeline = self.clone();
        let question = question.to_string();

        tokio::spawn(async move {
            let terminal = match pipeline.run(&question, &sink).await {
                Ok(_) => StreamEvent::Done,
                Err(e) => {
                    error!(error = %e, "Pipeline run failed");
                    StreamEvent::error(e.to_string())
                }
            };
            sink.publish(terminal).await;
        });

        ReceiverStream::new(rx)
    }
}

pub fn timeout_message(secs: u64) -> String {
    format!("抱歉，请求超时（{}秒），请稍后再试。", secs)
}
