//! Stage graph execution.
//!
//! A pipeline is a directed graph of [`Stage`]s connected by [`Edge`]s.
//! The [`GraphExecutor`] walks it from an entry stage, running each stage
//! against the shared [`PipelineState`](crate::PipelineState) and following
//! the first outgoing edge whose condition matches, until it reaches a stage
//! with no outgoing edges.

pub mod edge;
pub mod executor;
pub mod node;

pub use edge::{Edge, EdgeCondition};
pub use executor::{ExecutionResult, GraphExecutor};
pub use node::Stage;
