//! # Building Configuration
//!
//! Everything the dimension rules need to know about the building, as
//! collected by the configuration front end:
//!
//! ```text
//! BuildingConfig
//! ├── seismic_zone: "Zone III"
//! ├── total_floor_count / typical_floor_count
//! ├── floors: FloorType -> FloorDimensions (beam depths, special slabs)
//! ├── tolerances: GeometryTolerances
//! ├── naming: SectionNaming
//! └── wall_thickness_table: optional override of the built-in table
//! ```
//!
//! All structs implement `Default` and deserialize with `#[serde(default)]`,
//! so a job file only needs to carry the values that differ.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::catalog::SectionNaming;
use crate::errors::{FrameError, FrameResult};
use crate::geometry::GeometryTolerances;
use crate::rules::walls::{WallThicknessTable, DEFAULT_WALL_TABLE};
use crate::rules::{GravitySubtype, MainBeamSubtype};

static DEFAULT_FLOOR: Lazy<FloorDimensions> = Lazy::new(FloorDimensions::default);

/// Seismic zone per IS 1893
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeismicZone {
    II,
    III,
    IV,
    V,
}

impl SeismicZone {
    pub const ALL: [SeismicZone; 4] = [SeismicZone::II, SeismicZone::III, SeismicZone::IV, SeismicZone::V];

    /// Parse free-form zone text: "Zone III", "III", "zone-3", "3"
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.trim().to_ascii_lowercase();
        let rest = lower.strip_prefix("zone").unwrap_or(&lower);
        let rest = rest.trim_start_matches([' ', '-', '_']).trim();
        match rest {
            "ii" | "2" => Some(SeismicZone::II),
            "iii" | "3" => Some(SeismicZone::III),
            "iv" | "4" => Some(SeismicZone::IV),
            "v" | "5" => Some(SeismicZone::V),
            _ => None,
        }
    }

    /// Zones II and III are the low-demand zones
    pub fn is_low_seismic(&self) -> bool {
        matches!(self, SeismicZone::II | SeismicZone::III)
    }
}

impl std::fmt::Display for SeismicZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roman = match self {
            SeismicZone::II => "II",
            SeismicZone::III => "III",
            SeismicZone::IV => "IV",
            SeismicZone::V => "V",
        };
        write!(f, "Zone {roman}")
    }
}

/// Floor types with separately configured dimension tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum FloorType {
    #[default]
    Typical,
    Podium,
    Ground,
    Basement,
    EDeck,
    Terrace,
}

/// Per-floor-type dimension table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorDimensions {
    /// Gravity beam depth (mm) by sub-type; missing sub-types use InternalGravity
    pub gravity_depths_mm: BTreeMap<GravitySubtype, u32>,
    /// Main beam depth (mm) by wall type; missing entries use fixed fallbacks
    pub main_depths_mm: BTreeMap<MainBeamSubtype, u32>,
    /// Lobby slab thickness (mm)
    pub lobby_slab_mm: u32,
    /// Stair slab thickness (mm)
    pub stair_slab_mm: u32,
}

impl Default for FloorDimensions {
    fn default() -> Self {
        FloorDimensions {
            gravity_depths_mm: BTreeMap::from([(GravitySubtype::Internal, 450)]),
            main_depths_mm: BTreeMap::new(),
            lobby_slab_mm: 200,
            stair_slab_mm: 175,
        }
    }
}

/// Building-level configuration for one import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    /// Seismic zone as entered ("Zone III")
    pub seismic_zone: String,
    /// Total floors N covered by the grade schedule
    pub total_floor_count: u32,
    /// Typical floors, drives the wall thickness table
    pub typical_floor_count: u32,
    /// Dimension tables by floor type; missing types use `Typical`
    pub floors: BTreeMap<FloorType, FloorDimensions>,
    pub tolerances: GeometryTolerances,
    pub naming: SectionNaming,
    /// Replaces the built-in wall thickness table when present
    pub wall_thickness_table: Option<WallThicknessTable>,
    /// Measure cantilever spans from an adjacent wall instead of the shortest edge
    pub detect_cantilever_support: bool,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            seismic_zone: "Zone III".to_string(),
            total_floor_count: 10,
            typical_floor_count: 10,
            floors: BTreeMap::from([(FloorType::Typical, FloorDimensions::default())]),
            tolerances: GeometryTolerances::default(),
            naming: SectionNaming::default(),
            wall_thickness_table: None,
            detect_cantilever_support: false,
        }
    }
}

impl BuildingConfig {
    /// Parsed seismic zone, `None` if the text is not recognized
    pub fn zone(&self) -> Option<SeismicZone> {
        SeismicZone::parse(&self.seismic_zone)
    }

    /// Dimension table for a floor type, falling back to `Typical`
    pub fn floor(&self, floor_type: FloorType) -> &FloorDimensions {
        self.floors
            .get(&floor_type)
            .or_else(|| self.floors.get(&FloorType::Typical))
            .unwrap_or(&DEFAULT_FLOOR)
    }

    /// Wall thickness table in effect
    pub fn wall_table(&self) -> &WallThicknessTable {
        self.wall_thickness_table.as_ref().unwrap_or(&DEFAULT_WALL_TABLE)
    }

    /// Validate values the rules depend on.
    pub fn validate(&self) -> FrameResult<()> {
        if self.total_floor_count == 0 {
            return Err(FrameError::invalid_input(
                "total_floor_count",
                "0",
                "Building must have at least one floor",
            ));
        }
        if self.typical_floor_count > self.total_floor_count {
            return Err(FrameError::invalid_input(
                "typical_floor_count",
                self.typical_floor_count.to_string(),
                format!("Exceeds total floor count {}", self.total_floor_count),
            ));
        }
        let tol = &self.tolerances;
        if !(tol.unit_to_meter.is_finite() && tol.unit_to_meter > 0.0) {
            return Err(FrameError::invalid_input(
                "tolerances.unit_to_meter",
                tol.unit_to_meter.to_string(),
                "Scale must be positive",
            ));
        }
        let non_negative = [
            ("tolerances.closure_tolerance", tol.closure_tolerance),
            ("tolerances.duplicate_threshold", tol.duplicate_threshold),
            ("tolerances.dedupe_epsilon", tol.dedupe_epsilon),
            ("tolerances.min_area_m2", tol.min_area_m2),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FrameError::invalid_input(
                    field,
                    value.to_string(),
                    "Must be a finite, non-negative number",
                ));
            }
        }
        if tol.duplicate_threshold > tol.closure_tolerance {
            return Err(FrameError::invalid_input(
                "tolerances.duplicate_threshold",
                tol.duplicate_threshold.to_string(),
                "Duplicate threshold cannot exceed the closure tolerance",
            ));
        }
        if let Some(table) = &self.wall_thickness_table {
            table.validate()?;
        }
        if self.zone().is_none() {
            tracing::warn!(zone = %self.seismic_zone, "unrecognized seismic zone, using most severe values");
        }
        Ok(())
    }
}
