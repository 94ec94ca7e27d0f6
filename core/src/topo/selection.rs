use super::naming::TopoRank;
use serde::{Deserialize, Serialize};

/// Which kind of solid topology a pick may resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionFilter {
    Face,
    Edge,
    Vertex,
    Body,
    #[default]
    Any,
}

impl SelectionFilter {
    pub fn accepts(&self, rank: TopoRank) -> bool {
        match self {
            SelectionFilter::Any => true,
            SelectionFilter::Face => rank == TopoRank::Face,
            SelectionFilter::Edge => rank == TopoRank::Edge,
            SelectionFilter::Vertex => rank == TopoRank::Vertex,
            SelectionFilter::Body => matches!(rank, TopoRank::Solid | TopoRank::Shell | TopoRank::CompSolid | TopoRank::Compound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_ranks() {
        assert!(SelectionFilter::Any.accepts(TopoRank::Face));
        assert!(SelectionFilter::Edge.accepts(TopoRank::Edge));
        assert!(!SelectionFilter::Edge.accepts(TopoRank::Face));
        assert!(SelectionFilter::Body.accepts(TopoRank::Solid));
        assert!(!SelectionFilter::Body.accepts(TopoRank::Vertex));
    }
}
