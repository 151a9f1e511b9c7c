pub mod graph;
pub mod pipeline;
pub mod stages;
pub mod state;

pub use graph::{Edge, EdgeCondition, ExecutionResult, GraphExecutor, Stage};
pub use pipeline::Pipeline;
pub use stages::grade::{DocumentGrader, LexicalGrader, PassThroughGrader, Verdict};
pub use stages::PipelineDeps;
pub use state::{PipelineState, Route};
