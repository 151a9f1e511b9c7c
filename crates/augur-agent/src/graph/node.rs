use augur_tools::ToolKind;

use crate::state::Route;

/// A named step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Router,
    Retrieve,
    GradeDocuments,
    TransformQuery,
    Generate,
    Action(ToolKind),
}

impl Stage {
    pub fn id(self) -> &'static str {
        match self {
            Stage::Router => "router",
            Stage::Retrieve => "retrieve",
            Stage::GradeDocuments => "grade_documents",
            Stage::TransformQuery => "transform_query",
            Stage::Generate => "generate",
            Stage::Action(kind) => Route::Action(kind).as_str(),
        }
    }

    /// Progress text streamed to clients when the stage starts.
    pub fn status_message(self) -> String {
        match self {
            Stage::Router => "正在分析问题...".to_string(),
            Stage::Retrieve => "正在检索相关资料...".to_string(),
            Stage::GradeDocuments => "正在评估资料相关性...".to_string(),
            Stage::TransformQuery => "正在优化问题...".to_string(),
            Stage::Generate => "正在生成回答...".to_string(),
            Stage::Action(kind) => format!("Using tool: {}...", kind.name()),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
