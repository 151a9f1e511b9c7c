//! The stage implementations. None of them fails past its boundary: remote
//! errors degrade into fallback context, apology text or inline tool errors.

pub mod action;
pub mod generate;
pub mod grade;
pub mod retrieve;
pub mod router;
pub mod transform;

use std::sync::Arc;

use augur_core::config::{ModelConfig, PipelineConfig};
use augur_core::event::EventSink;
use augur_core::traits::{LlmClient, Retriever};

use crate::graph::Stage;
use crate::state::PipelineState;
use grade::DocumentGrader;

/// Shared, immutable dependencies of every stage.
pub struct PipelineDeps {
    pub llm: Arc<dyn LlmClient>,
    pub retriever: Arc<dyn Retriever>,
    pub grader: Arc<dyn DocumentGrader>,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

pub(crate) async fn run_stage(
    stage: Stage,
    deps: &PipelineDeps,
    state: &mut PipelineState,
    sink: &EventSink,
) {
    match stage {
        Stage::Router => router::route(state),
        Stage::Retrieve => retrieve::retrieve(deps, state).await,
        Stage::GradeDocuments => grade::grade_documents(deps, state),
        Stage::TransformQuery => transform::transform_query(state),
        Stage::Generate => generate::generate(deps, state, sink).await,
        Stage::Action(kind) => action::run_action(kind, state, sink).await,
    }
}
