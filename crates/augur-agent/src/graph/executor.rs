use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use augur_core::error::{AugurError, Result};
use augur_core::event::EventSink;

use super::edge::Edge;
use super::node::Stage;
use crate::stages::{run_stage, PipelineDeps};
use crate::state::PipelineState;

/// Result of executing the graph once.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub state: PipelineState,
    /// Stages in execution order.
    pub trace: Vec<Stage>,
    pub elapsed_ms: u64,
}

/// Walks the stage graph from `entry`, following the first matching edge.
pub struct GraphExecutor {
    edges: Vec<Edge>,
    entry: Stage,
    max_visits: usize,
}

impl GraphExecutor {
    pub fn new(edges: Vec<Edge>, entry: Stage, max_visits: usize) -> Self {
        Self {
            edges,
            entry,
            max_visits,
        }
    }

    /// The fixed pipeline topology.
    ///
    /// With `routing` the router is the entry and may dispatch straight to a
    /// tool action; without it every request enters at `retrieve`.
    pub fn pipeline(routing: bool, max_visits: usize) -> Self {
        use augur_tools::ToolKind;

        use crate::state::Route;

        let mut edges = Vec::new();
        if routing {
            for kind in ToolKind::ALL {
                edges.push(Edge::on_route(Stage::Router, Route::Action(kind), Stage::Action(kind)));
            }
            edges.push(Edge::on_route(Stage::Router, Route::Retrieve, Stage::Retrieve));
            edges.push(Edge::always(Stage::Router, Stage::Retrieve));
        }
        edges.push(Edge::always(Stage::Retrieve, Stage::GradeDocuments));
        edges.push(Edge::on_route(
            Stage::GradeDocuments,
            Route::TransformQuery,
            Stage::TransformQuery,
        ));
        edges.push(Edge::always(Stage::GradeDocuments, Stage::Generate));
        edges.push(Edge::always(Stage::TransformQuery, Stage::Retrieve));

        let entry = if routing { Stage::Router } else { Stage::Retrieve };
        Self::new(edges, entry, max_visits)
    }

    pub fn entry(&self) -> Stage {
        self.entry
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Run the graph to a terminal stage.
    pub async fn execute(
        &self,
        deps: &PipelineDeps,
        mut state: PipelineState,
        sink: &EventSink,
    ) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut trace = Vec::new();
        let mut visits: HashMap<Stage, usize> = HashMap::new();
        let mut current = self.entry;

        loop {
            let count = visits.entry(current).or_insert(0);
            *count += 1;
            if *count > self.max_visits {
                warn!(stage = %current, max_visits = self.max_visits, "Stage visit cap reached");
                return Err(AugurError::Pipeline(format!(
                    "stage '{}' visited more than {} times",
                    current, self.max_visits
                )));
            }
            trace.push(current);

            info!(stage = %current, "Executing stage");
            sink.status(current.status_message()).await;
            run_stage(current, deps, &mut state, sink).await;

            let outgoing: Vec<&Edge> = self.edges.iter().filter(|e| e.from == current).collect();
            if outgoing.is_empty() {
                debug!(stage = %current, "No outgoing edges, pipeline complete");
                break;
            }

            let next = outgoing
                .iter()
                .find(|e| e.matches(state.next_step))
                .map(|e| e.to)
                .ok_or_else(|| {
                    AugurError::Pipeline(format!("no edge out of '{}' matched", current))
                })?;

            debug!(
                from = %current,
                to = %next,
                next_step = ?state.next_step,
                "Following edge"
            );
            current = next;
        }

        Ok(ExecutionResult {
            state,
            trace,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Route;
    use augur_tools::ToolKind;

    fn targets(executor: &GraphExecutor, from: Stage) -> Vec<Stage> {
        executor
            .edges()
            .iter()
            .filter(|e| e.from == from)
            .map(|e| e.to)
            .collect()
    }

    #[test]
    fn test_routed_topology() {
        let g = GraphExecutor::pipeline(true, 8);
        assert_eq!(g.entry(), Stage::Router);

        let from_router = targets(&g, Stage::Router);
        for kind in ToolKind::ALL {
            assert!(from_router.contains(&Stage::Action(kind)));
        }
        // The unconditional fallback comes last
        assert_eq!(from_router.last(), Some(&Stage::Retrieve));

        assert_eq!(targets(&g, Stage::Retrieve), vec![Stage::GradeDocuments]);
        assert_eq!(
            targets(&g, Stage::GradeDocuments),
            vec![Stage::TransformQuery, Stage::Generate]
        );
        assert_eq!(targets(&g, Stage::TransformQuery), vec![Stage::Retrieve]);
        assert!(targets(&g, Stage::Generate).is_empty());
        assert!(targets(&g, Stage::Action(ToolKind::IChing)).is_empty());
    }

    #[test]
    fn test_legacy_topology_starts_at_retrieve() {
        let g = GraphExecutor::pipeline(false, 8);
        assert_eq!(g.entry(), Stage::Retrieve);
        assert!(targets(&g, Stage::Router).is_empty());
    }

    #[test]
    fn test_first_matching_edge_wins() {
        let g = GraphExecutor::pipeline(true, 8);
        let pick = |route: Option<Route>| {
            g.edges()
                .iter()
                .filter(|e| e.from == Stage::Router)
                .find(|e| e.matches(route))
                .map(|e| e.to)
        };
        assert_eq!(
            pick(Some(Route::Action(ToolKind::Zodiac))),
            Some(Stage::Action(ToolKind::Zodiac))
        );
        assert_eq!(pick(Some(Route::Generate)), Some(Stage::Retrieve));
        assert_eq!(pick(None), Some(Stage::Retrieve));
    }
}
