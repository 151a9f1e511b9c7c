use serde::Serialize;

use augur_core::types::ChatMessage;
use augur_tools::ToolKind;

/// Routing token written by the router and the grader, read by the next
/// conditional edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Generate,
    Retrieve,
    TransformQuery,
    Action(ToolKind),
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Generate => "generate",
            Route::Retrieve => "retrieve",
            Route::TransformQuery => "transform_query",
            Route::Action(ToolKind::IChing) => "action_iching",
            Route::Action(ToolKind::Horoscope) => "action_horoscope",
            Route::Action(ToolKind::Zodiac) => "action_zodiac",
            Route::Action(ToolKind::BaZi) => "action_bazi",
            Route::Action(ToolKind::Naming) => "action_naming",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record threaded through every stage of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineState {
    /// Current query text. Only the transform stage changes it.
    pub question: String,
    /// Context strings from the latest retrieval, replaced wholesale.
    pub documents: Vec<String>,
    /// Final answer, written by the terminal stage.
    pub generation: String,
    #[serde(skip)]
    pub next_step: Option<Route>,
    /// Append-only chat turns.
    pub messages: Vec<ChatMessage>,
    /// Transform passes so far.
    pub refinements: usize,
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }
}
