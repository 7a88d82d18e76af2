//! Beam dimension rules.
//!
//! - Gravity beams: width from the seismic zone only (200 mm in zones II and
//!   III, 240 mm otherwise); depth from the floor's gravity depth table.
//! - Main beams: width equals the thickness of the wall they frame into;
//!   depth from the floor's main depth table with fixed fallbacks.

use super::walls::wall_thickness_mm;
use super::{GravitySubtype, MainBeamSubtype, RequiredDimensions, WallType};
use crate::catalog::ElementFamily;
use crate::config::{BuildingConfig, FloorDimensions, FloorType, SeismicZone};
use crate::errors::{FrameError, FrameResult};
use crate::units::Meters;

/// Gravity beam width in low seismic zones (mm)
pub const GRAVITY_WIDTH_LOW_SEISMIC_MM: u32 = 200;

/// Gravity beam width elsewhere (mm)
pub const GRAVITY_WIDTH_MM: u32 = 240;

/// Wall length used when sizing a main beam from its wall
pub const NOMINAL_WALL_LENGTH: Meters = Meters(3.0);

/// Gravity beam width for a zone; unrecognized zones get the wider beam
pub fn gravity_beam_width_mm(zone: Option<SeismicZone>) -> u32 {
    match zone {
        Some(z) if z.is_low_seismic() => GRAVITY_WIDTH_LOW_SEISMIC_MM,
        _ => GRAVITY_WIDTH_MM,
    }
}

/// Configured depth for a gravity sub-type, falling back to InternalGravity
pub fn gravity_beam_depth_mm(floor: &FloorDimensions, subtype: GravitySubtype) -> FrameResult<u32> {
    floor
        .gravity_depths_mm
        .get(&subtype)
        .or_else(|| floor.gravity_depths_mm.get(&GravitySubtype::Internal))
        .copied()
        .ok_or_else(|| FrameError::missing_field("gravity_depths_mm.InternalGravity"))
}

pub fn gravity_beam_dimensions(
    config: &BuildingConfig,
    floor_type: FloorType,
    subtype: GravitySubtype,
) -> FrameResult<RequiredDimensions> {
    Ok(RequiredDimensions {
        family: ElementFamily::GravityBeam,
        width_mm: Some(gravity_beam_width_mm(config.zone())),
        depth_or_thickness_mm: gravity_beam_depth_mm(config.floor(floor_type), subtype)?,
    })
}

/// Depth used when the floor table has no entry for a main beam type
pub fn main_beam_fallback_depth_mm(subtype: MainBeamSubtype) -> u32 {
    match subtype {
        WallType::Core => 600,
        WallType::PeripheralDead => 600,
        WallType::PeripheralPortal => 650,
        WallType::Internal => 550,
    }
}

pub fn main_beam_depth_mm(floor: &FloorDimensions, subtype: MainBeamSubtype) -> u32 {
    floor
        .main_depths_mm
        .get(&subtype)
        .copied()
        .unwrap_or_else(|| main_beam_fallback_depth_mm(subtype))
}

/// Main beam dimensions; the width always matches the framed wall
pub fn main_beam_dimensions(
    config: &BuildingConfig,
    floor_type: FloorType,
    subtype: MainBeamSubtype,
) -> RequiredDimensions {
    RequiredDimensions {
        family: ElementFamily::MainBeam,
        width_mm: Some(wall_thickness_mm(config, subtype, NOMINAL_WALL_LENGTH, false)),
        depth_or_thickness_mm: main_beam_depth_mm(config.floor(floor_type), subtype),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_gravity_width_by_zone() {
        assert_eq!(gravity_beam_width_mm(Some(SeismicZone::II)), 200);
        assert_eq!(gravity_beam_width_mm(Some(SeismicZone::III)), 200);
        assert_eq!(gravity_beam_width_mm(Some(SeismicZone::IV)), 240);
        assert_eq!(gravity_beam_width_mm(Some(SeismicZone::V)), 240);
        assert_eq!(gravity_beam_width_mm(None), 240);
    }

    #[test]
    fn test_gravity_depth_fallback() {
        let floor = FloorDimensions {
            gravity_depths_mm: BTreeMap::from([
                (GravitySubtype::Internal, 450),
                (GravitySubtype::Cantilever, 600),
            ]),
            ..FloorDimensions::default()
        };
        assert_eq!(gravity_beam_depth_mm(&floor, GravitySubtype::Cantilever).unwrap(), 600);
        assert_eq!(gravity_beam_depth_mm(&floor, GravitySubtype::Podium).unwrap(), 450);
    }

    #[test]
    fn test_gravity_depth_missing_internal() {
        let floor = FloorDimensions {
            gravity_depths_mm: BTreeMap::from([(GravitySubtype::Podium, 500)]),
            ..FloorDimensions::default()
        };
        assert_eq!(gravity_beam_depth_mm(&floor, GravitySubtype::Podium).unwrap(), 500);
        let err = gravity_beam_depth_mm(&floor, GravitySubtype::Ground).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_gravity_dimensions_zone_three() {
        let config = BuildingConfig::default();
        let req = gravity_beam_dimensions(&config, FloorType::Typical, GravitySubtype::Internal).unwrap();
        assert_eq!(req.width_mm, Some(200));
        assert_eq!(req.depth_or_thickness_mm, 450);
    }

    #[test]
    fn test_main_beam_fallback_depths() {
        let floor = FloorDimensions::default();
        assert_eq!(main_beam_depth_mm(&floor, WallType::Core), 600);
        assert_eq!(main_beam_depth_mm(&floor, WallType::PeripheralDead), 600);
        assert_eq!(main_beam_depth_mm(&floor, WallType::PeripheralPortal), 650);
        assert_eq!(main_beam_depth_mm(&floor, WallType::Internal), 550);
    }

    #[test]
    fn test_main_beam_width_matches_wall() {
        let mut config = BuildingConfig::default();
        config
            .floors
            .get_mut(&FloorType::Typical)
            .unwrap()
            .main_depths_mm
            .insert(WallType::Core, 700);

        for wall_type in WallType::ALL {
            let req = main_beam_dimensions(&config, FloorType::Typical, wall_type);
            let wall = wall_thickness_mm(&config, wall_type, NOMINAL_WALL_LENGTH, false);
            assert_eq!(req.width_mm, Some(wall));
        }
        let core = main_beam_dimensions(&config, FloorType::Typical, WallType::Core);
        assert_eq!(core.depth_or_thickness_mm, 700);
        assert_eq!(core.width_mm, Some(250));
    }
}
