//! 2D geometry utilities for sketch-local coordinates.
//!
//! Everything here works on plain `[f64; 2]` points so that sketch
//! geometry, pattern transforms, picking and dimension layout can share
//! one vocabulary without converting through nalgebra types.

use std::f64::consts::{PI, TAU};

/// Tolerance for floating-point comparisons
pub const EPSILON: f64 = 1e-6;

/// Below this length a direction is considered undefined.
pub const DEGENERATE_LENGTH: f64 = 1e-10;

// =============================================================================
// Point Operations
// =============================================================================

/// Check if two 2D points are approximately equal within EPSILON.
#[inline]
pub fn points_equal(p1: [f64; 2], p2: [f64; 2]) -> bool {
    (p1[0] - p2[0]).abs() < EPSILON && (p1[1] - p2[1]).abs() < EPSILON
}

/// Compute squared distance between two 2D points.
#[inline]
pub fn distance_squared(p1: [f64; 2], p2: [f64; 2]) -> f64 {
    let dx = p2[0] - p1[0];
    let dy = p2[1] - p1[1];
    dx * dx + dy * dy
}

/// Compute distance between two 2D points.
#[inline]
pub fn distance(p1: [f64; 2], p2: [f64; 2]) -> f64 {
    distance_squared(p1, p2).sqrt()
}

/// Linear interpolation between two 2D points.
#[inline]
pub fn lerp(p1: [f64; 2], p2: [f64; 2], t: f64) -> [f64; 2] {
    [
        p1[0] + t * (p2[0] - p1[0]),
        p1[1] + t * (p2[1] - p1[1]),
    ]
}

/// Midpoint between two 2D points.
#[inline]
pub fn midpoint(p1: [f64; 2], p2: [f64; 2]) -> [f64; 2] {
    lerp(p1, p2, 0.5)
}

// =============================================================================
// Vector Operations
// =============================================================================

#[inline]
pub fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
pub fn add(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
pub fn scale(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}

/// `p + dir * t`
#[inline]
pub fn offset(p: [f64; 2], dir: [f64; 2], t: f64) -> [f64; 2] {
    [p[0] + dir[0] * t, p[1] + dir[1] * t]
}

#[inline]
pub fn length(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

/// 2D dot product.
#[inline]
pub fn dot_2d(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    v1[0] * v2[0] + v1[1] * v2[1]
}

/// Normalize a 2D vector, or `None` when it is shorter than [`DEGENERATE_LENGTH`].
#[inline]
pub fn try_normalize_2d(v: [f64; 2]) -> Option<[f64; 2]> {
    let len = length(v);
    if len < DEGENERATE_LENGTH {
        None
    } else {
        Some([v[0] / len, v[1] / len])
    }
}

/// Perpendicular vector (90° counter-clockwise rotation).
#[inline]
pub fn perpendicular_ccw(v: [f64; 2]) -> [f64; 2] {
    [-v[1], v[0]]
}

/// Unit vector at `angle` radians from +X.
#[inline]
pub fn direction_at(angle: f64) -> [f64; 2] {
    [angle.cos(), angle.sin()]
}

/// Angle of a vector from +X, in (-PI, PI].
#[inline]
pub fn angle_of(v: [f64; 2]) -> f64 {
    v[1].atan2(v[0])
}

/// Wrap an angle into [0, TAU).
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Smallest absolute difference between two undirected line angles, in [0, PI/2].
pub fn line_angle_deviation(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(PI);
    d.min(PI - d)
}

// =============================================================================
// Line Segment Operations
// =============================================================================

/// Find parameter t where point projects onto line segment.
/// Returns t such that point ≈ start + t * (end - start).
/// t in [0,1] means projection is on segment.
pub fn project_point_on_line(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> f64 {
    let dx = end[0] - start[0];
    let dy = end[1] - start[1];
    let len_sq = dx * dx + dy * dy;

    if len_sq < EPSILON * EPSILON {
        return 0.0;
    }

    let px = point[0] - start[0];
    let py = point[1] - start[1];

    (px * dx + py * dy) / len_sq
}

/// Compute perpendicular distance from point to infinite line.
pub fn distance_point_to_line(line_start: [f64; 2], line_end: [f64; 2], point: [f64; 2]) -> f64 {
    let dx = line_end[0] - line_start[0];
    let dy = line_end[1] - line_start[1];
    let len = (dx * dx + dy * dy).sqrt();

    if len < EPSILON {
        return distance(line_start, point);
    }

    let px = point[0] - line_start[0];
    let py = point[1] - line_start[1];
    ((px * dy - py * dx) / len).abs()
}

/// Foot of the perpendicular from `point` onto the infinite line.
pub fn foot_on_line(line_start: [f64; 2], line_end: [f64; 2], point: [f64; 2]) -> [f64; 2] {
    let t = project_point_on_line(line_start, line_end, point);
    lerp(line_start, line_end, t)
}

/// Compute closest point on line segment to given point.
pub fn closest_point_on_segment(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> [f64; 2] {
    let t = project_point_on_line(start, end, point).clamp(0.0, 1.0);
    lerp(start, end, t)
}

/// Distance from a point to a bounded segment.
pub fn distance_point_to_segment(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> f64 {
    distance(point, closest_point_on_segment(start, end, point))
}

// =============================================================================
// Line-Line Intersection
// =============================================================================

/// Calculate intersection point of two 2D line segments.
/// Returns Some(point) if segments intersect, None otherwise.
pub fn line_line_intersect(
    s1: [f64; 2], e1: [f64; 2],
    s2: [f64; 2], e2: [f64; 2],
) -> Option<[f64; 2]> {
    let (point, t, u) = line_line_intersect_unbounded(s1, e1, s2, e2)?;

    if t >= -EPSILON && t <= 1.0 + EPSILON && u >= -EPSILON && u <= 1.0 + EPSILON {
        Some(point)
    } else {
        None
    }
}

/// Calculate intersection of two infinite lines (unbounded).
/// Returns Some((point, t1, t2)) where t1, t2 are parameters on each line.
pub fn line_line_intersect_unbounded(
    s1: [f64; 2], e1: [f64; 2],
    s2: [f64; 2], e2: [f64; 2],
) -> Option<([f64; 2], f64, f64)> {
    let d1x = e1[0] - s1[0];
    let d1y = e1[1] - s1[1];
    let d2x = e2[0] - s2[0];
    let d2y = e2[1] - s2[1];

    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < EPSILON {
        return None;
    }

    let dx = s2[0] - s1[0];
    let dy = s2[1] - s1[1];

    let t = (dx * d2y - dy * d2x) / denom;
    let u = (dx * d1y - dy * d1x) / denom;

    Some(([s1[0] + t * d1x, s1[1] + t * d1y], t, u))
}

// =============================================================================
// Arc Utilities
// =============================================================================

/// Compute a point on an arc given center, radius, and angle (radians).
#[inline]
pub fn arc_point(center: [f64; 2], radius: f64, angle: f64) -> [f64; 2] {
    [
        center[0] + radius * angle.cos(),
        center[1] + radius * angle.sin(),
    ]
}

/// Counter-clockwise sweep from `start_angle` to `end_angle`, in [0, TAU).
pub fn ccw_sweep(start_angle: f64, end_angle: f64) -> f64 {
    normalize_angle(end_angle - start_angle)
}

/// Whether `angle` lies on the counter-clockwise sweep from start to end.
pub fn angle_in_sweep(angle: f64, start_angle: f64, end_angle: f64) -> bool {
    ccw_sweep(start_angle, angle) <= ccw_sweep(start_angle, end_angle) + EPSILON
}

/// Discretize an arc into line segments.
/// Returns `segments + 1` points from start_angle to end_angle.
pub fn discretize_arc(
    center: [f64; 2],
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    segments: usize,
) -> Vec<[f64; 2]> {
    let sweep = ccw_sweep(start_angle, end_angle);
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            arc_point(center, radius, start_angle + t * sweep)
        })
        .collect()
}

/// Point on a rotated ellipse at parameter `t`.
pub fn ellipse_point(center: [f64; 2], semi_major: f64, semi_minor: f64, rotation: f64, t: f64) -> [f64; 2] {
    let (x, y) = (semi_major * t.cos(), semi_minor * t.sin());
    let (s, c) = rotation.sin_cos();
    [center[0] + x * c - y * s, center[1] + x * s + y * c]
}
