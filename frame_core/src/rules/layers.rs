//! CAD layer classification.
//!
//! Every layer name is classified once, up front, into a [`LayerClass`].
//! Matching is case-insensitive substring matching in a fixed priority
//! order, so a "Cantilever Gravity" layer is a gravity beam and never a
//! cantilever slab:
//!
//! 1. `gravity` - gravity beam
//! 2. `main` - main beam
//! 3. `wall` - wall
//! 4. `lobby`, `stair`, `cantilever`/`balcony`/`chajja`, `slab` - slab kinds
//! 5. anything else - [`LayerClass::Unknown`]

use serde::{Deserialize, Serialize};

use crate::catalog::ElementFamily;

/// Gravity beam variants, each with its own configured depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GravitySubtype {
    #[serde(rename = "InternalGravity")]
    Internal,
    #[serde(rename = "CantileverGravity")]
    Cantilever,
    #[serde(rename = "NoLoadGravity")]
    NoLoad,
    #[serde(rename = "EDeckGravity")]
    EDeck,
    #[serde(rename = "PodiumGravity")]
    Podium,
    #[serde(rename = "GroundGravity")]
    Ground,
    #[serde(rename = "BasementGravity")]
    Basement,
}

impl GravitySubtype {
    pub const ALL: [GravitySubtype; 7] = [
        GravitySubtype::Internal,
        GravitySubtype::Cantilever,
        GravitySubtype::NoLoad,
        GravitySubtype::EDeck,
        GravitySubtype::Podium,
        GravitySubtype::Ground,
        GravitySubtype::Basement,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            GravitySubtype::Internal => "Internal Gravity",
            GravitySubtype::Cantilever => "Cantilever Gravity",
            GravitySubtype::NoLoad => "No-Load Gravity",
            GravitySubtype::EDeck => "E-Deck Gravity",
            GravitySubtype::Podium => "Podium Gravity",
            GravitySubtype::Ground => "Ground Gravity",
            GravitySubtype::Basement => "Basement Gravity",
        }
    }
}

/// Wall types; also the sub-type of the main beam framing into that wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WallType {
    Core,
    PeripheralDead,
    PeripheralPortal,
    Internal,
}

impl WallType {
    pub const ALL: [WallType; 4] = [
        WallType::Core,
        WallType::PeripheralDead,
        WallType::PeripheralPortal,
        WallType::Internal,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            WallType::Core => "Core",
            WallType::PeripheralDead => "Peripheral Dead",
            WallType::PeripheralPortal => "Peripheral Portal",
            WallType::Internal => "Internal",
        }
    }
}

/// Main beams are typed by the wall they frame into
pub type MainBeamSubtype = WallType;

/// Slab layer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlabKind {
    Lobby,
    Stair,
    Cantilever,
    Regular,
}

/// What a CAD layer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "subtype")]
pub enum LayerClass {
    Gravity(GravitySubtype),
    Main(MainBeamSubtype),
    Wall { wall_type: WallType, floating: bool },
    Slab(SlabKind),
    Unknown,
}

impl LayerClass {
    /// Catalog family the layer's elements are matched against
    pub fn family(&self) -> Option<ElementFamily> {
        match self {
            LayerClass::Gravity(_) => Some(ElementFamily::GravityBeam),
            LayerClass::Main(_) => Some(ElementFamily::MainBeam),
            LayerClass::Wall { .. } => Some(ElementFamily::Wall),
            LayerClass::Slab(_) => Some(ElementFamily::Slab),
            LayerClass::Unknown => None,
        }
    }

    /// Whether elements come from line geometry (beams, walls)
    pub fn is_linear(&self) -> bool {
        matches!(self, LayerClass::Gravity(_) | LayerClass::Main(_) | LayerClass::Wall { .. })
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn gravity_subtype(lower: &str) -> GravitySubtype {
    if contains_any(lower, &["no load", "no-load", "no_load", "noload"]) {
        GravitySubtype::NoLoad
    } else if contains_any(lower, &["e-deck", "e deck", "e_deck", "edeck"]) {
        GravitySubtype::EDeck
    } else if lower.contains("podium") {
        GravitySubtype::Podium
    } else if lower.contains("ground") {
        GravitySubtype::Ground
    } else if lower.contains("basement") {
        GravitySubtype::Basement
    } else if lower.contains("cantilever") {
        GravitySubtype::Cantilever
    } else {
        GravitySubtype::Internal
    }
}

fn wall_type(lower: &str) -> WallType {
    if lower.contains("core") {
        WallType::Core
    } else if lower.contains("portal") {
        WallType::PeripheralPortal
    } else if contains_any(lower, &["peripheral", "dead"]) {
        WallType::PeripheralDead
    } else {
        WallType::Internal
    }
}

/// Classify a CAD layer name
pub fn classify_layer(layer_name: &str) -> LayerClass {
    let lower = layer_name.to_lowercase();

    if lower.contains("gravity") {
        LayerClass::Gravity(gravity_subtype(&lower))
    } else if lower.contains("main") {
        LayerClass::Main(wall_type(&lower))
    } else if lower.contains("wall") {
        LayerClass::Wall {
            wall_type: wall_type(&lower),
            floating: lower.contains("floating"),
        }
    } else if lower.contains("lobby") {
        LayerClass::Slab(SlabKind::Lobby)
    } else if lower.contains("stair") {
        LayerClass::Slab(SlabKind::Stair)
    } else if contains_any(&lower, &["cantilever", "balcony", "chajja"]) {
        LayerClass::Slab(SlabKind::Cantilever)
    } else if lower.contains("slab") {
        LayerClass::Slab(SlabKind::Regular)
    } else {
        LayerClass::Unknown
    }
}
