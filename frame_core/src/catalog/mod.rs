//! # Section Catalog
//!
//! The structural-model template exposes a flat list of predefined section
//! names per element family. This module parses those names into
//! [`CatalogEntry`] lookup tables that the [`selector`](crate::selector)
//! searches.
//!
//! ## Empty families
//!
//! Beams and walls without any parseable entry are reported as
//! [`FrameError::CatalogEmpty`] when a layer of that family is imported.
//! Slabs never are: a standard set of thicknesses without a grade is
//! synthesized instead so slab import can still proceed.
//!
//! ## Example
//!
//! ```rust
//! use frame_core::catalog::{ElementFamily, SectionCatalog, SectionNaming};
//!
//! let catalog = SectionCatalog::from_names(
//!     ["B20X45M30", "B23X60M35", "MB23X60M35", "W20X300M40", "junk"],
//!     &SectionNaming::default(),
//! );
//!
//! assert_eq!(catalog.entries(ElementFamily::GravityBeam).len(), 2);
//! assert!(catalog.require(ElementFamily::Wall).is_ok());
//! // No slab names given: fallback thicknesses are synthesized
//! assert!(catalog.uses_fallback_slabs());
//! ```

pub mod cache;
pub mod naming;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

pub use cache::{CatalogCache, SectionSource};
pub use naming::{classify_section_name, grade_value, normalize_grade, parse_section_name, SectionNaming};

use crate::errors::{FrameError, FrameResult};

/// Slab thicknesses synthesized when the template defines no slab sections (mm)
pub const FALLBACK_SLAB_THICKNESSES_MM: [u32; 8] = [125, 150, 160, 175, 180, 200, 225, 250];

/// Element families with their own section tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementFamily {
    GravityBeam,
    MainBeam,
    Wall,
    Slab,
}

impl ElementFamily {
    pub const ALL: [ElementFamily; 4] = [
        ElementFamily::GravityBeam,
        ElementFamily::MainBeam,
        ElementFamily::Wall,
        ElementFamily::Slab,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ElementFamily::GravityBeam => "gravity beam",
            ElementFamily::MainBeam => "main beam",
            ElementFamily::Wall => "wall",
            ElementFamily::Slab => "slab",
        }
    }
}

impl std::fmt::Display for ElementFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One predefined section from the model template.
///
/// For walls `depth_or_thickness_mm` is the wall thickness and `width_mm`
/// the nominal panel length encoded in the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Section name as known to the host (unique key)
    pub section_name: String,
    pub family: ElementFamily,
    /// Width in mm; `None` for slabs
    pub width_mm: Option<u32>,
    /// Beam depth, wall thickness or slab thickness in mm
    pub depth_or_thickness_mm: u32,
    /// Normalized numeric grade ("35"); `None` for synthesized slabs
    pub grade: Option<String>,
}

impl CatalogEntry {
    /// Short description for logs ("200 x 450 mm M30")
    pub fn describe(&self) -> String {
        let grade = self
            .grade
            .as_deref()
            .map(|g| format!(" M{g}"))
            .unwrap_or_default();
        match self.width_mm {
            Some(w) => format!("{} x {} mm{}", w, self.depth_or_thickness_mm, grade),
            None => format!("{} mm{}", self.depth_or_thickness_mm, grade),
        }
    }
}

/// Parsed section tables, one per element family.
///
/// Immutable after construction; share it behind an `Arc` (see
/// [`CatalogCache`]).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionCatalog {
    entries: BTreeMap<ElementFamily, Vec<CatalogEntry>>,
    fallback_slabs: bool,
    skipped_names: usize,
}

impl SectionCatalog {
    /// Build from per-family name lists (the host's catalog query).
    ///
    /// Names that do not follow the family's pattern are skipped, as are
    /// repeated names.
    pub fn from_family_lists<I, S>(lists: I, naming: &SectionNaming) -> Self
    where
        I: IntoIterator<Item = (ElementFamily, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut catalog = SectionCatalog::default();
        let mut seen = HashSet::new();

        for (family, names) in lists {
            for name in names {
                let name = name.as_ref();
                match parse_section_name(name, family, naming) {
                    Some(entry) if seen.insert(entry.section_name.clone()) => catalog.push(entry),
                    Some(_) => {}
                    None => {
                        tracing::trace!(name, %family, "skipping unparseable section name");
                        catalog.skipped_names += 1;
                    }
                }
            }
        }

        catalog.finish(naming);
        catalog
    }

    /// Build from one flat list, classifying each name by its prefix
    pub fn from_names<I, S>(names: I, naming: &SectionNaming) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut catalog = SectionCatalog::default();
        let mut seen = HashSet::new();

        for name in names {
            let name = name.as_ref();
            match classify_section_name(name, naming) {
                Some(entry) if seen.insert(entry.section_name.clone()) => catalog.push(entry),
                Some(_) => {}
                None => {
                    tracing::trace!(name, "skipping unparseable section name");
                    catalog.skipped_names += 1;
                }
            }
        }

        catalog.finish(naming);
        catalog
    }

    fn push(&mut self, entry: CatalogEntry) {
        self.entries.entry(entry.family).or_default().push(entry);
    }

    fn finish(&mut self, naming: &SectionNaming) {
        if self.entries(ElementFamily::Slab).is_empty() {
            tracing::warn!("no slab sections in catalog, using standard thicknesses without grade");
            let fallback = FALLBACK_SLAB_THICKNESSES_MM
                .iter()
                .map(|&t| CatalogEntry {
                    section_name: naming.fallback_slab_name(t),
                    family: ElementFamily::Slab,
                    width_mm: None,
                    depth_or_thickness_mm: t,
                    grade: None,
                })
                .collect();
            self.entries.insert(ElementFamily::Slab, fallback);
            self.fallback_slabs = true;
        }

        for family in self.empty_families() {
            tracing::warn!(%family, "section catalog has no entries for family");
        }

        tracing::debug!(
            gravity_beams = self.entries(ElementFamily::GravityBeam).len(),
            main_beams = self.entries(ElementFamily::MainBeam).len(),
            walls = self.entries(ElementFamily::Wall).len(),
            slabs = self.entries(ElementFamily::Slab).len(),
            skipped = self.skipped_names,
            "section catalog parsed"
        );
    }

    /// Entries of one family, in catalog order
    pub fn entries(&self, family: ElementFamily) -> &[CatalogEntry] {
        self.entries.get(&family).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries of one family, or `CatalogEmpty`
    pub fn require(&self, family: ElementFamily) -> FrameResult<&[CatalogEntry]> {
        let entries = self.entries(family);
        if entries.is_empty() {
            Err(FrameError::catalog_empty(family.display_name()))
        } else {
            Ok(entries)
        }
    }

    /// Look up an entry by section name
    pub fn get(&self, section_name: &str) -> Option<&CatalogEntry> {
        self.entries
            .values()
            .flatten()
            .find(|e| e.section_name == section_name)
    }

    /// Families with no entries
    pub fn empty_families(&self) -> Vec<ElementFamily> {
        ElementFamily::ALL
            .into_iter()
            .filter(|f| self.entries(*f).is_empty())
            .collect()
    }

    /// Whether slab entries were synthesized
    pub fn uses_fallback_slabs(&self) -> bool {
        self.fallback_slabs
    }

    /// Names that did not parse
    pub fn skipped_names(&self) -> usize {
        self.skipped_names
    }

    /// Total number of entries across families
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
