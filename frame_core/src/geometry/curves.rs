//! Curve flattening for hatch boundary paths.
//!
//! Curved boundary edges are approximated with a fixed number of segments
//! so downstream polygon processing only ever sees straight edges. Angles
//! and ellipse parameters are in radians.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::Point2;

/// Segments used to flatten a circular arc
pub const ARC_SEGMENTS: usize = 16;

/// Segments used to flatten an elliptical arc
pub const ELLIPSE_SEGMENTS: usize = 24;

/// Consecutive edge endpoints closer than this are the same vertex
const JOIN_EPSILON: f64 = 1e-6;

/// Shortest distance from `p` to the segment `a`-`b`
pub fn point_to_segment_distance(p: Point2, a: Point2, b: Point2) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let (wx, wy) = (p.x - a.x, p.y - a.y);

    let c1 = wx * vx + wy * vy;
    if c1 <= 0.0 {
        return p.distance_to(a);
    }

    let c2 = vx * vx + vy * vy;
    if c2 <= c1 {
        return p.distance_to(b);
    }

    let t = c1 / c2;
    p.distance_to(Point2::new(a.x + vx * t, a.y + vy * t))
}

/// Positive sweep from `start` to `end`, in (0, TAU]
fn positive_sweep(start: f64, end: f64) -> f64 {
    let sweep = (end - start).rem_euclid(TAU);
    if sweep == 0.0 {
        TAU
    } else {
        sweep
    }
}

/// Flatten a circular arc into `ARC_SEGMENTS + 1` points, start to end.
///
/// Equal start and end angles describe a full circle.
pub fn tessellate_arc(
    center: Point2,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    counter_clockwise: bool,
) -> Vec<Point2> {
    let sweep = if counter_clockwise {
        positive_sweep(start_angle, end_angle)
    } else {
        -positive_sweep(end_angle, start_angle)
    };

    (0..=ARC_SEGMENTS)
        .map(|i| {
            let angle = start_angle + sweep * (i as f64) / (ARC_SEGMENTS as f64);
            Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Flatten an elliptical arc into `ELLIPSE_SEGMENTS + 1` points.
///
/// `major_axis` is the vector from the center to the end of the major axis;
/// the minor axis is perpendicular to it with length `ratio` times the major.
pub fn tessellate_ellipse(
    center: Point2,
    major_axis: Point2,
    ratio: f64,
    start_param: f64,
    end_param: f64,
) -> Vec<Point2> {
    let minor = Point2::new(-major_axis.y * ratio, major_axis.x * ratio);
    let sweep = positive_sweep(start_param, end_param);

    (0..=ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = start_param + sweep * (i as f64) / (ELLIPSE_SEGMENTS as f64);
            let (sin, cos) = t.sin_cos();
            Point2::new(
                center.x + major_axis.x * cos + minor.x * sin,
                center.y + major_axis.y * cos + minor.y * sin,
            )
        })
        .collect()
}

/// One edge of a hatch boundary path, as delivered by the CAD reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BoundarySegment {
    Line {
        start: Point2,
        end: Point2,
    },
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        #[serde(default = "default_ccw")]
        counter_clockwise: bool,
    },
    Ellipse {
        center: Point2,
        major_axis: Point2,
        ratio: f64,
        start_param: f64,
        end_param: f64,
    },
    /// Approximated by its control points; the curve itself is not evaluated
    Spline { control_points: Vec<Point2> },
}

fn default_ccw() -> bool {
    true
}

impl BoundarySegment {
    /// Vertices approximating this edge, start to end
    pub fn flatten(&self) -> Vec<Point2> {
        match self {
            BoundarySegment::Line { start, end } => vec![*start, *end],
            BoundarySegment::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                counter_clockwise,
            } => tessellate_arc(*center, *radius, *start_angle, *end_angle, *counter_clockwise),
            BoundarySegment::Ellipse {
                center,
                major_axis,
                ratio,
                start_param,
                end_param,
            } => tessellate_ellipse(*center, *major_axis, *ratio, *start_param, *end_param),
            BoundarySegment::Spline { control_points } => control_points.clone(),
        }
    }
}

/// Concatenate the flattened edges of one boundary path.
///
/// A vertex shared by consecutive edges is emitted once.
pub fn flatten_boundary_path(segments: &[BoundarySegment]) -> Vec<Point2> {
    let mut points: Vec<Point2> = Vec::new();
    for segment in segments {
        for p in segment.flatten() {
            match points.last() {
                Some(last) if last.distance_to(p) < JOIN_EPSILON => {}
                _ => points.push(p),
            }
        }
    }
    points
}
