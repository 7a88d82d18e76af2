//! Slab thickness rules.
//!
//! | Slab kind | Rule |
//! |---|---|
//! | Lobby, Stair | configured fixed thickness |
//! | Cantilever (cantilever/balcony/chajja) | step function of span |
//! | Regular | step function of area |

use super::{RequiredDimensions, SlabKind};
use crate::catalog::ElementFamily;
use crate::config::FloorDimensions;
use crate::units::{Meters, SquareMeters};

/// Absorbs unit-conversion noise at band edges
const BAND_EPSILON: f64 = 1e-9;

/// (max span m, thickness mm)
pub const CANTILEVER_BANDS: [(f64, u32); 4] = [(1.0, 125), (1.5, 160), (1.8, 180), (5.0, 200)];

/// Cantilever thickness beyond the last band
pub const CANTILEVER_CEILING_MM: u32 = 200;

/// (max area m2, thickness mm)
pub const AREA_BANDS: [(f64, u32); 7] = [
    (14.0, 125),
    (22.0, 150),
    (30.0, 160),
    (40.0, 175),
    (50.0, 200),
    (60.0, 225),
    (70.0, 250),
];

/// Regular slab thickness beyond the last band
pub const AREA_CEILING_MM: u32 = 250;

fn step(value: f64, bands: &[(f64, u32)], ceiling: u32) -> u32 {
    bands
        .iter()
        .find(|(limit, _)| value <= limit + BAND_EPSILON)
        .map(|(_, thickness)| *thickness)
        .unwrap_or(ceiling)
}

/// Cantilever slab thickness from its span
pub fn cantilever_thickness_mm(span: Meters) -> u32 {
    step(span.0, &CANTILEVER_BANDS, CANTILEVER_CEILING_MM)
}

/// Regular slab thickness from its area
pub fn area_thickness_mm(area: SquareMeters) -> u32 {
    step(area.0, &AREA_BANDS, AREA_CEILING_MM)
}

/// Measured slab geometry the rules need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabGeometry {
    pub area: SquareMeters,
    /// Cantilever span (support edge to free edge)
    pub span: Meters,
}

pub fn slab_thickness_mm(kind: SlabKind, floor: &FloorDimensions, geometry: SlabGeometry) -> u32 {
    match kind {
        SlabKind::Lobby => floor.lobby_slab_mm,
        SlabKind::Stair => floor.stair_slab_mm,
        SlabKind::Cantilever => cantilever_thickness_mm(geometry.span),
        SlabKind::Regular => area_thickness_mm(geometry.area),
    }
}

pub fn slab_dimensions(kind: SlabKind, floor: &FloorDimensions, geometry: SlabGeometry) -> RequiredDimensions {
    RequiredDimensions {
        family: ElementFamily::Slab,
        width_mm: None,
        depth_or_thickness_mm: slab_thickness_mm(kind, floor, geometry),
    }
}
