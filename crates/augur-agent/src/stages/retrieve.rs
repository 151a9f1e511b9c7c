use tracing::{debug, warn};

use super::PipelineDeps;
use crate::state::PipelineState;

/// Replace `documents` with fresh context. Errors and empty results both
/// become the one-element fallback context.
pub async fn retrieve(deps: &PipelineDeps, state: &mut PipelineState) {
    let documents = match deps.retriever.retrieve(&state.question).await {
        Ok(docs) if !docs.is_empty() => {
            debug!(retriever = deps.retriever.name(), count = docs.len(), "Retrieved documents");
            docs
        }
        Ok(_) => {
            debug!(retriever = deps.retriever.name(), "No documents found, using fallback context");
            vec![deps.pipeline.fallback_context.clone()]
        }
        Err(e) => {
            warn!(retriever = deps.retriever.name(), error = %e, "Retrieval failed, using fallback context");
            vec![deps.pipeline.fallback_context.clone()]
        }
    };
    state.documents = documents;
}
