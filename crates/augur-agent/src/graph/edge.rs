use crate::graph::node::Stage;
use crate::state::Route;

/// An edge connecting two stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: Stage,
    pub to: Stage,
    pub condition: EdgeCondition,
}

/// Condition for traversing an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum EdgeCondition {
    /// Always traverse this edge.
    #[default]
    Always,
    /// Traverse when the state's routing token equals the route.
    OnRoute(Route),
}

impl Edge {
    /// Create an unconditional edge.
    pub fn always(from: Stage, to: Stage) -> Self {
        Self {
            from,
            to,
            condition: EdgeCondition::Always,
        }
    }

    /// Create an edge taken only for one routing token.
    pub fn on_route(from: Stage, route: Route, to: Stage) -> Self {
        Self {
            from,
            to,
            condition: EdgeCondition::OnRoute(route),
        }
    }

    pub fn matches(&self, next_step: Option<Route>) -> bool {
        match self.condition {
            EdgeCondition::Always => true,
            EdgeCondition::OnRoute(route) => next_step == Some(route),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_builders() {
        let e = Edge::always(Stage::Retrieve, Stage::GradeDocuments);
        assert_eq!(e.from, Stage::Retrieve);
        assert_eq!(e.to, Stage::GradeDocuments);
        assert_eq!(e.condition, EdgeCondition::Always);

        let e = Edge::on_route(Stage::GradeDocuments, Route::TransformQuery, Stage::TransformQuery);
        assert_eq!(e.condition, EdgeCondition::OnRoute(Route::TransformQuery));
    }

    #[test]
    fn test_matches() {
        let always = Edge::always(Stage::GradeDocuments, Stage::Generate);
        assert!(always.matches(None));
        assert!(always.matches(Some(Route::TransformQuery)));

        let refine = Edge::on_route(Stage::GradeDocuments, Route::TransformQuery, Stage::TransformQuery);
        assert!(refine.matches(Some(Route::TransformQuery)));
        assert!(!refine.matches(Some(Route::Generate)));
        assert!(!refine.matches(None));
    }
}
