//! # Unit Types
//!
//! Type-safe wrappers for the handful of units that cross module boundaries.
//! They are plain `f64` newtypes that serialize as bare numbers.
//!
//! ## Conventions
//!
//! - CAD coordinates arrive in *input units* (millimeter-like) and are
//!   converted to meters with a fixed scalar, [`MM_TO_M`] by default.
//!   Only X and Y are scaled; elevations already arrive in meters.
//! - Section dimensions are whole millimeters (`u32`), not wrapped here.
//! - Spans are [`Meters`], slab areas are [`SquareMeters`].
//!
//! ## Example
//!
//! ```rust
//! use frame_core::units::{Meters, SquareMeters};
//!
//! let span = Meters::from_input_units(1200.0, 0.001);
//! assert!((span.0 - 1.2).abs() < 1e-12);
//! assert_eq!(span.to_string(), "1.200 m");
//!
//! let area = SquareMeters::from_input_units(20_000_000.0, 0.001);
//! assert!((area.0 - 20.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default scale from CAD input units (millimeters) to meters
pub const MM_TO_M: f64 = 0.001;

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

impl Meters {
    /// Convert a length in input units using an explicit scale
    pub fn from_input_units(length: f64, unit_to_meter: f64) -> Self {
        Meters(length * unit_to_meter)
    }
}

/// Area in square meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

impl SquareMeters {
    /// Convert an area in squared input units; the scale is applied squared
    pub fn from_input_units(area: f64, unit_to_meter: f64) -> Self {
        SquareMeters(area * unit_to_meter * unit_to_meter)
    }
}

// Log formatting: fixed precision plus the unit symbol
macro_rules! impl_unit_display {
    ($type:ty, $symbol:literal, $precision:literal) => {
        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.*} {}", $precision, self.0, $symbol)
            }
        }
    };
}

impl_unit_display!(Meters, "m", 3);
impl_unit_display!(SquareMeters, "m²", 2);
