//! # Dimension Rules
//!
//! Pure functions from (building configuration, element kind, measured
//! geometry) to the [`RequiredDimensions`] the selector matches against.
//!
//! | Family | Width | Depth / thickness |
//! |---|---|---|
//! | Gravity beam | seismic zone | floor table by sub-type |
//! | Main beam | framed wall thickness | floor table, fixed fallbacks |
//! | Wall | - | thickness table |
//! | Slab | - | fixed, span bands or area bands |

pub mod beams;
pub mod layers;
pub mod slabs;
pub mod walls;

use serde::{Deserialize, Serialize};

pub use beams::{gravity_beam_dimensions, main_beam_dimensions};
pub use layers::{classify_layer, GravitySubtype, LayerClass, MainBeamSubtype, SlabKind, WallType};
pub use slabs::{slab_dimensions, SlabGeometry};
pub use walls::{wall_dimensions, WallThicknessTable, DEFAULT_WALL_TABLE};

use crate::catalog::ElementFamily;

/// Target dimensions for one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDimensions {
    pub family: ElementFamily,
    /// Beam width in mm; `None` for walls and slabs
    pub width_mm: Option<u32>,
    pub depth_or_thickness_mm: u32,
}

impl RequiredDimensions {
    pub fn describe(&self) -> String {
        match self.width_mm {
            Some(w) => format!("{} {} x {} mm", self.family, w, self.depth_or_thickness_mm),
            None => format!("{} {} mm", self.family, self.depth_or_thickness_mm),
        }
    }
}

impl std::fmt::Display for RequiredDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
