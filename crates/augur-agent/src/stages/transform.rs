use tracing::debug;

use crate::state::PipelineState;

pub const REFINED_MARKER: &str = " (refined)";

pub fn transform_query(state: &mut PipelineState) {
    state.question.push_str(REFINED_MARKER);
    state.refinements += 1;
    debug!(refinements = state.refinements, question = %state.question, "Refined query");
}
