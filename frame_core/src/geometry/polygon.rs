//! Boundary polygon measurement and cleanup.
//!
//! A CAD boundary goes through [`clean_boundary`] before any of its
//! coordinates reach the host:
//!
//! 1. at least 3 raw vertices
//! 2. closure check ([`close_boundary`])
//! 3. near-duplicate removal ([`remove_near_duplicates`])
//! 4. at least 3 vertices left
//! 5. absolute area above the floor
//! 6. counter-clockwise winding
//!
//! Failures at any step are [`FrameError::GeometryInvalid`], which the
//! importer counts as a skip rather than a failure.

use serde::{Deserialize, Serialize};

use super::curves::point_to_segment_distance;
use super::{GeometryTolerances, Point2};
use crate::errors::{FrameError, FrameResult};
use crate::units::{Meters, SquareMeters};

/// Signed polygon area in square meters (shoelace formula).
///
/// Positive for counter-clockwise winding, negative for clockwise. The
/// polygon is treated as implicitly closed; fewer than 3 points give zero.
pub fn polygon_signed_area(points: &[Point2], unit_to_meter: f64) -> SquareMeters {
    if points.len() < 3 {
        return SquareMeters(0.0);
    }

    // Work relative to the first vertex; CAD drawings often sit far from the origin
    let origin = points[0];
    let n = points.len();
    let mut twice_area = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        let (xi, yi) = (points[i].x - origin.x, points[i].y - origin.y);
        let (xj, yj) = (points[j].x - origin.x, points[j].y - origin.y);
        twice_area += xi * yj - xj * yi;
    }

    SquareMeters::from_input_units(twice_area * 0.5, unit_to_meter)
}

/// How a boundary was closed by [`close_boundary`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Closure {
    /// Last vertex duplicated the first and was dropped
    DuplicateRemoved,
    /// Small gap accepted as closed; vertices untouched
    AutoClosed { gap: f64 },
}

/// Check that a boundary is closed, auto-closing small digitization gaps.
///
/// | gap between first and last vertex | result |
/// |---|---|
/// | `< duplicate_threshold` | last vertex dropped |
/// | `< tolerance` | unchanged, auto-closed |
/// | `>= tolerance` | `GeometryInvalid` (open boundary) |
pub fn close_boundary(
    points: &[Point2],
    tolerance: f64,
    duplicate_threshold: f64,
) -> FrameResult<(Closure, Vec<Point2>)> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => (*first, *last),
        _ => {
            return Err(FrameError::geometry_invalid(format!(
                "boundary has {} vertices",
                points.len()
            )))
        }
    };

    let gap = first.distance_to(last);
    if gap >= tolerance {
        return Err(FrameError::geometry_invalid(format!(
            "boundary is open: gap {gap:.3} >= tolerance {tolerance:.3}"
        )));
    }

    if gap < duplicate_threshold {
        Ok((Closure::DuplicateRemoved, points[..points.len() - 1].to_vec()))
    } else {
        Ok((Closure::AutoClosed { gap }, points.to_vec()))
    }
}

/// Drop vertices closer than `epsilon` to their cyclic successor.
///
/// Only near-duplicates are removed; collinear vertices are kept.
pub fn remove_near_duplicates(points: &[Point2], epsilon: f64) -> Vec<Point2> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }

    (0..n)
        .filter(|&i| points[i].distance_to(points[(i + 1) % n]) >= epsilon)
        .map(|i| points[i])
        .collect()
}

/// Shortest cyclic edge of a boundary, in meters.
///
/// Used as the cantilever span proxy: the support edge of a simple
/// rectangular cantilever panel is taken to be its shortest side.
pub fn minimum_edge_length(points: &[Point2], unit_to_meter: f64) -> Meters {
    let n = points.len();
    if n < 2 {
        return Meters(0.0);
    }

    let shortest = (0..n)
        .map(|i| points[i].distance_to(points[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min);

    Meters::from_input_units(shortest, unit_to_meter)
}

/// A cleaned, closed, counter-clockwise boundary.
///
/// Only [`clean_boundary`] constructs one, so holding a `BoundaryPolygon`
/// means every cleanup invariant holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryPolygon {
    points: Vec<Point2>,
    area: SquareMeters,
    unit_to_meter: f64,
    closure: Closure,
}

impl BoundaryPolygon {
    /// Vertices in CCW order, without a repeated closing vertex
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Absolute area in square meters
    pub fn area(&self) -> SquareMeters {
        self.area
    }

    /// How the raw boundary was closed
    pub fn closure(&self) -> Closure {
        self.closure
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Shortest edge in meters
    pub fn min_edge(&self) -> Meters {
        minimum_edge_length(&self.points, self.unit_to_meter)
    }

    /// Edges as (start, end) pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Span from a support edge to the farthest vertex, in meters
    pub fn support_span(&self, support: (Point2, Point2)) -> Meters {
        let farthest = self
            .points
            .iter()
            .map(|p| point_to_segment_distance(*p, support.0, support.1))
            .fold(0.0, f64::max);
        Meters::from_input_units(farthest, self.unit_to_meter)
    }

    /// Find a polygon edge that lies along one of `supports`.
    ///
    /// An edge matches when both of its endpoints are within `tolerance`
    /// of the same support segment. The longest matching edge wins.
    pub fn find_support_edge(
        &self,
        supports: &[(Point2, Point2)],
        tolerance: f64,
    ) -> Option<(Point2, Point2)> {
        self.edges()
            .filter(|(p, q)| {
                supports.iter().any(|(a, b)| {
                    point_to_segment_distance(*p, *a, *b) <= tolerance
                        && point_to_segment_distance(*q, *a, *b) <= tolerance
                })
            })
            .max_by(|(p1, q1), (p2, q2)| {
                p1.distance_to(*q1).total_cmp(&p2.distance_to(*q2))
            })
    }
}

/// Run the full cleanup pipeline on a raw CAD boundary.
pub fn clean_boundary(points: &[Point2], tol: &GeometryTolerances) -> FrameResult<BoundaryPolygon> {
    if points.len() < 3 {
        return Err(FrameError::geometry_invalid(format!(
            "too few vertices: {}",
            points.len()
        )));
    }

    let (closure, closed) = close_boundary(points, tol.closure_tolerance, tol.duplicate_threshold)?;
    let mut cleaned = remove_near_duplicates(&closed, tol.dedupe_epsilon);

    if cleaned.len() < 3 {
        return Err(FrameError::geometry_invalid(format!(
            "too few vertices after cleanup: {}",
            cleaned.len()
        )));
    }

    let signed = polygon_signed_area(&cleaned, tol.unit_to_meter);
    if signed.0.abs() < tol.min_area_m2 {
        return Err(FrameError::geometry_invalid(format!(
            "degenerate area: {:.6} m2",
            signed.0.abs()
        )));
    }

    if signed.0 < 0.0 {
        cleaned.reverse();
    }

    Ok(BoundaryPolygon {
        points: cleaned,
        area: SquareMeters(signed.0.abs()),
        unit_to_meter: tol.unit_to_meter,
        closure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::MM_TO_M;

    fn square_ccw() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1000.0, 0.0),
            Point2::new(1000.0, 1000.0),
            Point2::new(0.0, 1000.0),
        ]
    }

    fn rect(w: f64, h: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
            Point2::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_unit_square_area_ccw() {
        let area = polygon_signed_area(&square_ccw(), MM_TO_M);
        assert!((area.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unit_square_area_cw() {
        let mut cw = square_ccw();
        cw.reverse();
        let area = polygon_signed_area(&cw, MM_TO_M);
        assert!((area.0 + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_far_from_origin() {
        let offset: Vec<Point2> = square_ccw()
            .into_iter()
            .map(|p| Point2::new(p.x + 5.0e6, p.y + 3.0e6))
            .collect();
        let area = polygon_signed_area(&offset, MM_TO_M);
        assert!((area.0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_too_few_points() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(1000.0, 0.0)];
        assert_eq!(polygon_signed_area(&line, MM_TO_M).0, 0.0);
    }

    #[test]
    fn test_close_exact_duplicate_removed() {
        let pts = rect(1000.0, 1000.0);
        let (closure, closed) = close_boundary(&pts, 10.0, 0.5).unwrap();
        assert_eq!(closure, Closure::DuplicateRemoved);
        assert_eq!(closed.len(), 4);
        assert_eq!(closed[..], pts[..4]);
    }

    #[test]
    fn test_close_small_gap_untouched() {
        let mut pts = rect(4000.0, 3000.0);
        // Last vertex 50 units short of the first
        *pts.last_mut().unwrap() = Point2::new(0.0, 50.0);
        let (closure, closed) = close_boundary(&pts, 10_000.0, 0.5).unwrap();
        assert_eq!(closed, pts);
        assert!(matches!(closure, Closure::AutoClosed { gap } if (gap - 50.0).abs() < 1e-9));
    }

    #[test]
    fn test_close_open_polyline_rejected() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5000.0, 0.0),
            Point2::new(5000.0, 5000.0),
        ];
        let err = close_boundary(&pts, 10.0, 0.5).unwrap_err();
        assert_eq!(err.error_code(), "GEOMETRY_INVALID");
    }

    #[test]
    fn test_remove_near_duplicates() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1000.0, 0.0),
            Point2::new(1000.2, 0.1),
            Point2::new(1000.0, 1000.0),
            Point2::new(0.0, 1000.0),
        ];
        let cleaned = remove_near_duplicates(&pts, 1.0);
        assert_eq!(cleaned.len(), 4);
        assert_eq!(cleaned[1], Point2::new(1000.2, 0.1));
    }

    #[test]
    fn test_remove_near_duplicates_keeps_collinear() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(500.0, 0.0),
            Point2::new(1000.0, 0.0),
            Point2::new(1000.0, 1000.0),
        ];
        assert_eq!(remove_near_duplicates(&pts, 1.0).len(), 4);
    }

    #[test]
    fn test_minimum_edge_length() {
        let pts = rect(4000.0, 1200.0);
        let (_, closed) = close_boundary(&pts, 10.0, 0.5).unwrap();
        let span = minimum_edge_length(&closed, MM_TO_M);
        assert!((span.0 - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_clean_boundary_reorients_cw() {
        let mut pts = rect(2000.0, 1000.0);
        pts.reverse();
        let poly = clean_boundary(&pts, &GeometryTolerances::default()).unwrap();
        assert_eq!(poly.vertex_count(), 4);
        assert!((poly.area().0 - 2.0).abs() < 1e-9);
        assert!(polygon_signed_area(poly.points(), MM_TO_M).0 > 0.0);
    }

    #[test]
    fn test_clean_boundary_degenerate() {
        // 10 mm x 10 mm = 0.0001 m2, below the floor
        let pts = rect(10.0, 10.0);
        let err = clean_boundary(&pts, &GeometryTolerances::default()).unwrap_err();
        assert!(err.to_string().contains("degenerate"));
    }

    #[test]
    fn test_clean_boundary_collapsed_vertices() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.3, 0.0),
            Point2::new(0.3, 0.3),
            Point2::new(0.0, 0.0),
        ];
        assert!(clean_boundary(&pts, &GeometryTolerances::default()).is_err());
    }

    #[test]
    fn test_clean_boundary_too_few_vertices() {
        let pts = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        let err = clean_boundary(&pts, &GeometryTolerances::default()).unwrap_err();
        assert!(err.to_string().contains("too few vertices"));
    }

    #[test]
    fn test_support_span() {
        let poly = clean_boundary(&rect(4000.0, 1500.0), &GeometryTolerances::default()).unwrap();
        // Wall running along the long bottom edge
        let wall = (Point2::new(-500.0, 0.0), Point2::new(4500.0, 0.0));
        let edge = poly.find_support_edge(&[wall], 10.0).unwrap();
        assert!((edge.0.distance_to(edge.1) - 4000.0).abs() < 1e-9);
        assert!((poly.support_span(edge).0 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_find_support_edge_none() {
        let poly = clean_boundary(&rect(4000.0, 1500.0), &GeometryTolerances::default()).unwrap();
        let far_wall = (Point2::new(0.0, 5000.0), Point2::new(4000.0, 5000.0));
        assert!(poly.find_support_edge(&[far_wall], 10.0).is_none());
    }

    #[test]
    fn test_auto_closed_gap_then_deduplicated() {
        // Gap of 0.8 sits between the duplicate threshold (0.5) and the
        // dedupe epsilon (1.0): accepted as closed, then merged away
        let mut pts = square_ccw();
        pts.push(Point2::new(0.8, 0.0));

        let poly = clean_boundary(&pts, &GeometryTolerances::default()).unwrap();
        assert!(matches!(poly.closure(), Closure::AutoClosed { gap } if (gap - 0.8).abs() < 1e-12));
        assert_eq!(poly.vertex_count(), 4);
        assert!(!poly.points().contains(&Point2::new(0.8, 0.0)));
        assert!((poly.area().0 - 1.0).abs() < 1e-9);
        assert!((poly.min_edge().0 - 1.0).abs() < 1e-9);
    }
}
