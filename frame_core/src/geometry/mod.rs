//! # Plan Geometry
//!
//! Cleanup and measurement of 2-D CAD geometry before it is emitted to the
//! structural host.
//!
//! - [`polygon`] - signed area, closure, near-duplicate removal, minimum edge,
//!   and the [`BoundaryPolygon`] cleaning pipeline
//! - [`curves`] - point-to-segment distance and flattening of arcs, ellipses
//!   and splines into polyline vertices
//!
//! Coordinates are in CAD *input units* until they leave this module; see
//! [`GeometryTolerances::unit_to_meter`].

pub mod curves;
pub mod polygon;

use serde::{Deserialize, Serialize};

pub use curves::{
    flatten_boundary_path, point_to_segment_distance, tessellate_arc, tessellate_ellipse,
    BoundarySegment, ARC_SEGMENTS, ELLIPSE_SEGMENTS,
};
pub use polygon::{
    clean_boundary, close_boundary, minimum_edge_length, polygon_signed_area,
    remove_near_duplicates, BoundaryPolygon, Closure,
};

use crate::units::MM_TO_M;

/// 2-D point in CAD input units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Point2::new(p[0], p[1])
    }
}

/// 3-D point in meters, as handed to the structural host
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lift a plan point to host coordinates.
    ///
    /// X and Y are scaled to meters; `elevation_m` is already in meters and
    /// is used as-is.
    pub fn from_plan(p: Point2, unit_to_meter: f64, elevation_m: f64) -> Self {
        Self {
            x: p.x * unit_to_meter,
            y: p.y * unit_to_meter,
            z: elevation_m,
        }
    }
}

/// Numeric tolerances used by boundary cleanup.
///
/// Lengths are in input units; `min_area_m2` is in square meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryTolerances {
    /// Input unit to meter scale applied to X/Y
    pub unit_to_meter: f64,
    /// First/last gaps below this are treated as closed
    pub closure_tolerance: f64,
    /// First/last gaps below this are a duplicate closing vertex
    pub duplicate_threshold: f64,
    /// Consecutive vertices closer than this are merged
    pub dedupe_epsilon: f64,
    /// Boundaries with a smaller absolute area are degenerate
    pub min_area_m2: f64,
}

impl Default for GeometryTolerances {
    fn default() -> Self {
        GeometryTolerances {
            unit_to_meter: MM_TO_M,
            closure_tolerance: 10.0,
            duplicate_threshold: 0.5,
            dedupe_epsilon: 1.0,
            min_area_m2: 0.01,
        }
    }
}
