//! Candidate selection shared by the dimension and measure tools.

use crate::config::EngineConfig;
use crate::sketch::query::{nearest_entity, nearest_point};
use crate::sketch::types::{ConstraintPoint, Sketch, SketchGeometry};
use crate::topo::EntityId;
use serde::{Deserialize, Serialize};

/// Identity of a candidate; two candidates with the same kind are the same
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateKind {
    Entity(EntityId),
    Point(ConstraintPoint),
    Origin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Resolved position at selection time (the click for whole entities).
    pub position: [f64; 2],
}

impl Candidate {
    pub fn entity(id: EntityId, position: [f64; 2]) -> Self {
        Self { kind: CandidateKind::Entity(id), position }
    }

    pub fn point(point: ConstraintPoint, position: [f64; 2]) -> Self {
        if point.is_origin() {
            return Self::origin();
        }
        Self { kind: CandidateKind::Point(point), position }
    }

    pub fn origin() -> Self {
        Self { kind: CandidateKind::Origin, position: [0.0, 0.0] }
    }

    /// The point reference this candidate stands for, if it is point-like.
    pub fn as_point(&self) -> Option<ConstraintPoint> {
        match self.kind {
            CandidateKind::Point(cp) => Some(cp),
            CandidateKind::Origin => Some(ConstraintPoint::origin()),
            CandidateKind::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match self.kind {
            CandidateKind::Entity(id) => Some(id),
            _ => None,
        }
    }

    pub fn line(&self, sketch: &Sketch) -> Option<EntityId> {
        let id = self.as_entity()?;
        matches!(sketch.entity(id)?.geometry, SketchGeometry::Line { .. }).then_some(id)
    }
}

/// What is under the cursor: canonical points win over whole entities.
pub fn candidate_at(sketch: &Sketch, p: [f64; 2], config: &EngineConfig) -> Option<Candidate> {
    let threshold = config.entity_pick_threshold;
    if let Some((cp, pos)) = nearest_point(sketch, p, threshold) {
        return Some(Candidate::point(cp, pos));
    }
    nearest_entity(sketch, p, threshold).map(|id| Candidate::entity(id, p))
}

/// Ordered set of candidates with toggle semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    items: Vec<Candidate>,
}

impl CandidateSet {
    pub fn items(&self) -> &[Candidate] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the candidate if already present, otherwise append it unless
    /// the set already holds `capacity` items. Returns true if it changed.
    pub fn toggle(&mut self, candidate: Candidate, capacity: usize) -> bool {
        if let Some(i) = self.items.iter().position(|c| c.kind == candidate.kind) {
            self.items.remove(i);
            return true;
        }
        if self.items.len() >= capacity {
            return false;
        }
        self.items.push(candidate);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::types::SketchPlane;

    #[test]
    fn test_points_win_over_entities() {
        let mut sketch = Sketch::new(SketchPlane::default());
        let line = sketch.add_entity(SketchGeometry::Line { start: [1.0, 1.0], end: [5.0, 1.0] });
        let config = EngineConfig::default();

        let at_end = candidate_at(&sketch, [1.1, 1.0], &config).unwrap();
        assert_eq!(at_end.kind, CandidateKind::Point(ConstraintPoint::new(line, 0)));

        let mid = candidate_at(&sketch, [3.0, 1.2], &config).unwrap();
        assert_eq!(mid.kind, CandidateKind::Entity(line));

        let origin = candidate_at(&sketch, [0.1, -0.1], &config).unwrap();
        assert_eq!(origin.kind, CandidateKind::Origin);
    }

    #[test]
    fn test_toggle_semantics() {
        let mut set = CandidateSet::default();
        let a = Candidate::origin();
        let b = Candidate::entity(EntityId::new(), [1.0, 0.0]);
        assert!(set.toggle(a, 2));
        assert!(set.toggle(b, 2));
        assert!(!set.toggle(Candidate::entity(EntityId::new(), [0.0, 0.0]), 2));
        assert!(set.toggle(a, 2));
        assert_eq!(set.items(), &[b]);
    }
}
