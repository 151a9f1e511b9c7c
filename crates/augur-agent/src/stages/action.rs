use tracing::{debug, warn};

use augur_core::event::EventSink;
use augur_tools::{call_from_question, error_value, ToolKind};

use crate::state::PipelineState;

/// Run a tool on the current question and make its JSON the answer.
/// Inputs the question does not carry turn into an inline error object.
pub async fn run_action(kind: ToolKind, state: &mut PipelineState, sink: &EventSink) {
    let value = match call_from_question(kind, &state.question) {
        Ok(call) => call.execute(),
        Err(e) => {
            warn!(tool = kind.name(), error = %e, "Could not build tool input");
            error_value(&e)
        }
    };

    let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
    debug!(tool = kind.name(), "Tool finished");
    sink.token(text.clone()).await;
    state.generation = text;
}
