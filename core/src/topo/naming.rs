use serde::{Deserialize, Serialize};
use super::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TopoRank {
    Vertex = 0,
    Edge = 1,
    Wire = 2,
    Face = 3,
    Shell = 4,
    Solid = 5,
    CompSolid = 6,
    Compound = 7,
}

/// A stable identifier for a topological entity of a solid body
/// (e.g. "Face 5 of Extrude 1"), as assigned by the solver process.
/// The client treats it as opaque and only compares and echoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopoId {
    /// The feature that generated this topology.
    pub feature_id: EntityId,
    /// Feature-local identifier.
    pub local_id: u64,
    pub rank: TopoRank,
}

impl TopoId {
    pub fn new(feature_id: EntityId, local_id: u64, rank: TopoRank) -> Self {
        Self {
            feature_id,
            local_id,
            rank,
        }
    }
}
