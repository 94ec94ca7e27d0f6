//! Ephemeral, non-driving measurements.
//!
//! Nothing here touches the sketch; results live only as long as the UI
//! shows them.

use super::query::{resolve_point, point_position};
use super::tools::selection::{Candidate, CandidateKind};
use super::types::{Sketch, SketchEntity, SketchGeometry};
use crate::geometry::utils_2d::{ccw_sweep, distance, distance_point_to_line, dot_2d, sub, try_normalize_2d};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MeasurementResult {
    Distance { value: f64 },
    /// Radians, in [0, PI]
    Angle { value: f64 },
    Radius { value: f64 },
    ArcLength { value: f64 },
    Circumference { value: f64 },
    Length { value: f64 },
}

impl MeasurementResult {
    pub fn value(&self) -> f64 {
        match *self {
            MeasurementResult::Distance { value }
            | MeasurementResult::Angle { value }
            | MeasurementResult::Radius { value }
            | MeasurementResult::ArcLength { value }
            | MeasurementResult::Circumference { value }
            | MeasurementResult::Length { value } => value,
        }
    }
}

pub fn measure_point_point_distance(p1: [f64; 2], p2: [f64; 2]) -> f64 {
    distance(p1, p2)
}

/// Perpendicular distance to the infinite line; a degenerate line
/// measures to its start point.
pub fn measure_point_line_distance(point: [f64; 2], line_start: [f64; 2], line_end: [f64; 2]) -> f64 {
    distance_point_to_line(line_start, line_end, point)
}

/// Angle between two line directions, in [0, PI]. Degenerate lines give 0.
pub fn measure_line_line_angle(l1_start: [f64; 2], l1_end: [f64; 2], l2_start: [f64; 2], l2_end: [f64; 2]) -> f64 {
    match (try_normalize_2d(sub(l1_end, l1_start)), try_normalize_2d(sub(l2_end, l2_start))) {
        (Some(u1), Some(u2)) => dot_2d(u1, u2).clamp(-1.0, 1.0).acos(),
        _ => 0.0,
    }
}

/// Length of the counter-clockwise sweep from start to end.
pub fn measure_arc_length(radius: f64, start_angle: f64, end_angle: f64) -> f64 {
    radius.abs() * ccw_sweep(start_angle, end_angle)
}

pub fn measure_circumference(radius: f64) -> f64 {
    TAU * radius.abs()
}

/// Measurement between two entities, when the pair has a meaning.
pub fn measure_entities(entity1: &SketchEntity, entity2: &SketchEntity) -> Option<MeasurementResult> {
    use SketchGeometry::*;

    if entity1.id == entity2.id {
        return measure_entity(entity1);
    }

    let result = match (&entity1.geometry, &entity2.geometry) {
        (Line { start: s1, end: e1 }, Line { start: s2, end: e2 }) => {
            MeasurementResult::Angle { value: measure_line_line_angle(*s1, *e1, *s2, *e2) }
        }
        (Point { pos }, Line { start, end }) | (Line { start, end }, Point { pos }) => {
            MeasurementResult::Distance { value: measure_point_line_distance(*pos, *start, *end) }
        }
        (Line { .. }, _) | (_, Line { .. }) => return None,
        // Everything else reduces to its canonical 0 point (position or center).
        _ => MeasurementResult::Distance {
            value: measure_point_point_distance(point_position(entity1, 0)?, point_position(entity2, 0)?),
        },
    };
    Some(result)
}

/// Single-entity measurement: line length, circle radius, arc length.
pub fn measure_entity(entity: &SketchEntity) -> Option<MeasurementResult> {
    match entity.geometry {
        SketchGeometry::Line { start, end } => Some(MeasurementResult::Length { value: distance(start, end) }),
        SketchGeometry::Circle { radius, .. } => Some(MeasurementResult::Radius { value: radius.abs() }),
        SketchGeometry::Arc { radius, start_angle, end_angle, .. } => {
            Some(MeasurementResult::ArcLength { value: measure_arc_length(radius, start_angle, end_angle) })
        }
        _ => None,
    }
}

fn candidate_position(sketch: &Sketch, candidate: &Candidate) -> Option<[f64; 2]> {
    match candidate.kind {
        CandidateKind::Origin => Some([0.0, 0.0]),
        CandidateKind::Point(cp) => resolve_point(sketch, &cp),
        CandidateKind::Entity(_) => Some(candidate.position),
    }
}

/// Measure whatever the candidate list describes: two points give a
/// distance, a point and a line the perpendicular distance, two lines the
/// angle, a single entity its intrinsic size.
pub fn measure_selection(sketch: &Sketch, candidates: &[Candidate]) -> Option<MeasurementResult> {
    match candidates {
        [single] => match single.kind {
            CandidateKind::Entity(id) => measure_entity(sketch.entity(id)?),
            _ => None,
        },
        [a, b] => match (a.kind, b.kind) {
            (CandidateKind::Entity(ia), CandidateKind::Entity(ib)) => {
                measure_entities(sketch.entity(ia)?, sketch.entity(ib)?)
            }
            (CandidateKind::Entity(line), _) | (_, CandidateKind::Entity(line)) => {
                let point = if matches!(a.kind, CandidateKind::Entity(_)) { b } else { a };
                let p = candidate_position(sketch, point)?;
                match sketch.entity(line)?.geometry {
                    SketchGeometry::Line { start, end } => {
                        Some(MeasurementResult::Distance { value: measure_point_line_distance(p, start, end) })
                    }
                    SketchGeometry::Circle { center, .. } | SketchGeometry::Arc { center, .. } => {
                        Some(MeasurementResult::Distance { value: distance(p, center) })
                    }
                    _ => None,
                }
            }
            _ => Some(MeasurementResult::Distance {
                value: distance(candidate_position(sketch, a)?, candidate_position(sketch, b)?),
            }),
        },
        _ => None,
    }
}
