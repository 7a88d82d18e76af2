//! Wall thickness recommendation.
//!
//! Thickness is looked up from a table keyed by the number of typical
//! floors, then increased for wall type, seismic zone, short walls and
//! floating walls:
//!
//! ```text
//! t = band(floors) + type(wall) + zone(seismic) + short(length) + floating
//! ```
//!
//! Every increment is non-negative and the bands are non-decreasing, so
//! thickness never drops as floor count or seismic demand grows. The
//! built-in table lives in `data/wall_thickness.json`; a job file may
//! supply its own.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{RequiredDimensions, WallType};
use crate::catalog::ElementFamily;
use crate::config::{BuildingConfig, SeismicZone};
use crate::errors::{FrameError, FrameResult};
use crate::units::Meters;

/// Built-in wall thickness table
pub static DEFAULT_WALL_TABLE: Lazy<WallThicknessTable> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../data/wall_thickness.json"))
        .expect("embedded wall thickness table is valid")
});

/// Upper bound for any base thickness or increment in a table (mm)
pub const MAX_TABLE_VALUE_MM: u32 = 2000;

/// Base thickness for buildings up to `max_floors` typical floors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorBand {
    pub max_floors: u32,
    pub thickness_mm: u32,
}

/// Table-driven wall thickness data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallThicknessTable {
    /// Ascending by `max_floors`
    pub floor_bands: Vec<FloorBand>,
    /// Base thickness above the last band
    pub above_bands_mm: u32,
    #[serde(default)]
    pub wall_type_increment_mm: BTreeMap<WallType, u32>,
    #[serde(default)]
    pub zone_increment_mm: BTreeMap<SeismicZone, u32>,
    /// Walls shorter than this get `short_wall_increment_mm`
    pub short_wall_length_m: f64,
    pub short_wall_increment_mm: u32,
    pub floating_increment_mm: u32,
}

impl WallThicknessTable {
    /// Check the table keeps thickness non-decreasing in floors and zone.
    pub fn validate(&self) -> FrameResult<()> {
        if self.floor_bands.is_empty() {
            return Err(FrameError::missing_field("wall_thickness_table.floor_bands"));
        }
        for pair in self.floor_bands.windows(2) {
            if pair[1].max_floors <= pair[0].max_floors || pair[1].thickness_mm < pair[0].thickness_mm {
                return Err(FrameError::invalid_input(
                    "wall_thickness_table.floor_bands",
                    format!("{} floors", pair[1].max_floors),
                    "Bands must ascend in floors with non-decreasing thickness",
                ));
            }
        }
        let last = self.floor_bands[self.floor_bands.len() - 1];
        if self.above_bands_mm < last.thickness_mm {
            return Err(FrameError::invalid_input(
                "wall_thickness_table.above_bands_mm",
                self.above_bands_mm.to_string(),
                "Must not be thinner than the last band",
            ));
        }
        let values = self
            .floor_bands
            .iter()
            .map(|band| ("floor_bands.thickness_mm", band.thickness_mm))
            .chain([
                ("above_bands_mm", self.above_bands_mm),
                ("short_wall_increment_mm", self.short_wall_increment_mm),
                ("floating_increment_mm", self.floating_increment_mm),
            ])
            .chain(self.wall_type_increment_mm.values().map(|v| ("wall_type_increment_mm", *v)))
            .chain(self.zone_increment_mm.values().map(|v| ("zone_increment_mm", *v)));
        for (field, value) in values {
            if value > MAX_TABLE_VALUE_MM {
                return Err(FrameError::invalid_input(
                    format!("wall_thickness_table.{field}"),
                    value.to_string(),
                    format!("Must not exceed {MAX_TABLE_VALUE_MM} mm"),
                ));
            }
        }
        if !(self.short_wall_length_m.is_finite() && self.short_wall_length_m >= 0.0) {
            return Err(FrameError::invalid_input(
                "wall_thickness_table.short_wall_length_m",
                self.short_wall_length_m.to_string(),
                "Must be a finite, non-negative length",
            ));
        }
        let zone_steps: Vec<u32> = SeismicZone::ALL.iter().map(|z| self.zone_increment(Some(*z))).collect();
        if zone_steps.windows(2).any(|w| w[1] < w[0]) {
            return Err(FrameError::invalid_input(
                "wall_thickness_table.zone_increment_mm",
                format!("{zone_steps:?}"),
                "Increments must not decrease with seismic zone",
            ));
        }
        Ok(())
    }

    fn base_thickness(&self, typical_floors: u32) -> u32 {
        self.floor_bands
            .iter()
            .find(|band| typical_floors <= band.max_floors)
            .map(|band| band.thickness_mm)
            .unwrap_or(self.above_bands_mm)
    }

    /// Unknown zones take the largest increment
    fn zone_increment(&self, zone: Option<SeismicZone>) -> u32 {
        match zone {
            Some(z) => self.zone_increment_mm.get(&z).copied().unwrap_or(0),
            None => self.zone_increment_mm.values().copied().max().unwrap_or(0),
        }
    }

    /// Recommended thickness in mm
    pub fn recommend(
        &self,
        typical_floors: u32,
        wall_type: WallType,
        zone: Option<SeismicZone>,
        length: Meters,
        floating: bool,
    ) -> u32 {
        let short = if length.0 < self.short_wall_length_m {
            self.short_wall_increment_mm
        } else {
            0
        };
        let floating = if floating { self.floating_increment_mm } else { 0 };
        [
            self.wall_type_increment_mm.get(&wall_type).copied().unwrap_or(0),
            self.zone_increment(zone),
            short,
            floating,
        ]
        .into_iter()
        .fold(self.base_thickness(typical_floors), u32::saturating_add)
    }
}

/// Wall thickness for the configured building
pub fn wall_thickness_mm(config: &BuildingConfig, wall_type: WallType, length: Meters, floating: bool) -> u32 {
    config
        .wall_table()
        .recommend(config.typical_floor_count, wall_type, config.zone(), length, floating)
}

/// Required dimensions for a wall of the given length
pub fn wall_dimensions(config: &BuildingConfig, wall_type: WallType, length: Meters, floating: bool) -> RequiredDimensions {
    RequiredDimensions {
        family: ElementFamily::Wall,
        width_mm: None,
        depth_or_thickness_mm: wall_thickness_mm(config, wall_type, length, floating),
    }
}
