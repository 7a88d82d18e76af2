//! # frame_core - Floor-Plan to Structural Model Engine
//!
//! `frame_core` turns 2-D CAD floor-plan geometry into structural elements
//! (beams, walls, slabs) sized against the sections predefined in a
//! structural-model template, with concrete grades resolved per story.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Pipeline
//!
//! ```text
//! layer name ─► rules::classify_layer ─► rules (required dimensions)
//! story      ─► grades (preferred grade)                    │
//!                                                           ▼
//! host sections ─► catalog ───────────────────────► selector ─► section name
//! CAD boundary  ─► geometry::clean_boundary ─────────────────► host points
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use frame_core::catalog::{SectionCatalog, SectionNaming};
//! use frame_core::config::{BuildingConfig, FloorType};
//! use frame_core::grades::{GradeSchedule, GradeScheduleRow};
//! use frame_core::rules::{gravity_beam_dimensions, GravitySubtype};
//! use frame_core::selector::select;
//!
//! let catalog = SectionCatalog::from_names(["B20X45M35", "B24X45M35", "B20X45M45"], &SectionNaming::default());
//! let schedule = GradeSchedule::new(vec![
//!     GradeScheduleRow::new(1, 3, "M45"),
//!     GradeScheduleRow::new(4, 7, "M30"),
//! ]);
//!
//! let config = BuildingConfig::default();
//! let required = gravity_beam_dimensions(&config, FloorType::Typical, GravitySubtype::Internal).unwrap();
//! let grade = schedule.beam_slab_grade_for_story(2);
//!
//! let section = select(&catalog, &required, grade.as_deref()).unwrap();
//! assert_eq!(section.section_name, "B20X45M35");
//! ```
//!
//! ## Modules
//!
//! - [`geometry`] - Boundary cleanup, polygon measures, curve flattening
//! - [`catalog`] - Section-name parsing and the catalog cache
//! - [`rules`] - Layer classification and dimension rules
//! - [`selector`] - Best-fit section selection
//! - [`grades`] - Per-story grade schedule
//! - [`import`] - Story import driver and the structural host interface
//! - [`config`] - Building configuration
//! - [`job`] - Job file container
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - Job files with atomic saves and locking

pub mod catalog;
pub mod config;
pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod geometry;
pub mod grades;
pub mod import;
pub mod job;
pub mod rules;
pub mod selector;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use catalog::{CatalogCache, CatalogEntry, ElementFamily, SectionCatalog};
pub use config::BuildingConfig;
pub use errors::{FrameError, FrameResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_job, load_model, save_job, FileLock};
pub use grades::{GradeSchedule, GradeScheduleRow};
pub use import::{Importer, RecordingHost, StructuralHost};
pub use job::{JobFile, JobMetadata};
