//! Structural host interface.
//!
//! The analysis application that receives the generated model is reached
//! only through [`StructuralHost`]. Every call returns the name the host
//! assigned, or the host's non-zero return code.

use std::cell::Cell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{ElementFamily, SectionSource};
use crate::geometry::Point3;

/// Primitive-creation calls into the structural model.
///
/// Catalog queries come from the [`SectionSource`] supertrait.
pub trait StructuralHost: SectionSource {
    /// Create a point (meters) and return its name
    fn add_point(&mut self, point: Point3) -> Result<String, i32>;

    /// Create a frame between two named points
    fn add_frame(&mut self, start: &str, end: &str, section: &str, story: &str) -> Result<String, i32>;

    /// Create an area over named points, in order
    fn add_area(&mut self, points: &[String], section: &str, story: &str) -> Result<String, i32>;
}

/// Frame created in a [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub name: String,
    pub start: String,
    pub end: String,
    pub section: String,
    pub story: String,
}

/// Area created in a [`RecordingHost`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedArea {
    pub name: String,
    pub points: Vec<String>,
    pub section: String,
    pub story: String,
}

/// In-memory host that records every primitive.
///
/// Used by the CLI for dry runs and by tests. Sections listed in
/// `failing_sections` make frame and area calls return the given code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingHost {
    pub sections: BTreeMap<ElementFamily, Vec<String>>,
    pub points: BTreeMap<String, Point3>,
    pub frames: Vec<RecordedFrame>,
    pub areas: Vec<RecordedArea>,
    #[serde(default)]
    pub failing_sections: BTreeMap<String, i32>,
    #[serde(skip)]
    catalog_queries: Cell<usize>,
}

impl RecordingHost {
    pub fn new(sections: BTreeMap<ElementFamily, Vec<String>>) -> Self {
        RecordingHost {
            sections,
            ..RecordingHost::default()
        }
    }

    /// Make every frame/area call using `section` fail with `code`
    pub fn fail_section(&mut self, section: impl Into<String>, code: i32) {
        self.failing_sections.insert(section.into(), code);
    }

    /// Number of `section_names` calls served
    pub fn catalog_queries(&self) -> usize {
        self.catalog_queries.get()
    }

    fn check_section(&self, section: &str) -> Result<(), i32> {
        match self.failing_sections.get(section) {
            Some(&code) => Err(code),
            None => Ok(()),
        }
    }
}

impl SectionSource for RecordingHost {
    fn section_names(&self, family: ElementFamily) -> Vec<String> {
        self.catalog_queries.set(self.catalog_queries.get() + 1);
        self.sections.get(&family).cloned().unwrap_or_default()
    }
}

impl StructuralHost for RecordingHost {
    fn add_point(&mut self, point: Point3) -> Result<String, i32> {
        if !(point.x.is_finite() && point.y.is_finite() && point.z.is_finite()) {
            return Err(1);
        }
        let name = format!("P{}", self.points.len() + 1);
        self.points.insert(name.clone(), point);
        Ok(name)
    }

    fn add_frame(&mut self, start: &str, end: &str, section: &str, story: &str) -> Result<String, i32> {
        self.check_section(section)?;
        if !self.points.contains_key(start) || !self.points.contains_key(end) {
            return Err(2);
        }
        let name = format!("F{}", self.frames.len() + 1);
        self.frames.push(RecordedFrame {
            name: name.clone(),
            start: start.to_string(),
            end: end.to_string(),
            section: section.to_string(),
            story: story.to_string(),
        });
        Ok(name)
    }

    fn add_area(&mut self, points: &[String], section: &str, story: &str) -> Result<String, i32> {
        self.check_section(section)?;
        if points.len() < 3 || points.iter().any(|p| !self.points.contains_key(p)) {
            return Err(2);
        }
        let name = format!("A{}", self.areas.len() + 1);
        self.areas.push(RecordedArea {
            name: name.clone(),
            points: points.to_vec(),
            section: section.to_string(),
            story: story.to_string(),
        });
        Ok(name)
    }
}
