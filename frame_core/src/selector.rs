//! # Section Selector
//!
//! Picks the catalog entry closest to a set of required dimensions.
//!
//! ```text
//! distance = 2 * |depth - required depth| + |width - required width|
//! ```
//!
//! Depth counts double: a beam that is too shallow or too deep matters
//! more than one that is slightly wide. The width term is dropped when
//! either side has no width (walls, slabs).
//!
//! Candidates with exactly the preferred grade are searched first; if none
//! exist the whole family is searched. Equal distances resolve to the
//! lexicographically smallest section name.

use crate::catalog::{normalize_grade, CatalogEntry, ElementFamily, SectionCatalog};
use crate::errors::{FrameError, FrameResult};
use crate::rules::RequiredDimensions;

/// Weighted dimension distance between an entry and the requirement
pub fn selection_distance(entry: &CatalogEntry, required: &RequiredDimensions) -> u64 {
    let depth = u64::from(entry.depth_or_thickness_mm.abs_diff(required.depth_or_thickness_mm));
    let width = match (entry.width_mm, required.width_mm) {
        (Some(have), Some(want)) => u64::from(have.abs_diff(want)),
        _ => 0,
    };
    2 * depth + width
}

fn closest<'a>(
    candidates: impl Iterator<Item = &'a CatalogEntry>,
    required: &RequiredDimensions,
) -> Option<&'a CatalogEntry> {
    candidates.min_by(|a, b| {
        selection_distance(a, required)
            .cmp(&selection_distance(b, required))
            .then_with(|| a.section_name.cmp(&b.section_name))
    })
}

/// Best entry within one list of candidates
pub fn select_from<'a>(
    entries: &'a [CatalogEntry],
    required: &RequiredDimensions,
    preferred_grade: Option<&str>,
) -> Option<&'a CatalogEntry> {
    let grade = preferred_grade.map(normalize_grade).filter(|g| !g.is_empty());

    if let Some(grade) = grade.as_deref() {
        let matched = closest(
            entries.iter().filter(|e| e.grade.as_deref() == Some(grade)),
            required,
        );
        if matched.is_some() {
            return matched;
        }
        tracing::debug!(grade, family = %required.family, "no section with preferred grade, searching all grades");
    }

    closest(entries.iter(), required)
}

/// Select the best-fit section for `required`.
///
/// Main beams fall back to gravity-beam sections when the template has no
/// main-beam sections.
pub fn select<'a>(
    catalog: &'a SectionCatalog,
    required: &RequiredDimensions,
    preferred_grade: Option<&str>,
) -> FrameResult<&'a CatalogEntry> {
    let mut entries = catalog.entries(required.family);
    if entries.is_empty() && required.family == ElementFamily::MainBeam {
        tracing::debug!("no main beam sections, falling back to gravity beam sections");
        entries = catalog.entries(ElementFamily::GravityBeam);
    }

    let entry = select_from(entries, required, preferred_grade)
        .ok_or_else(|| FrameError::no_section_match(required.family.display_name(), required.describe()))?;

    tracing::trace!(
        required = %required,
        grade = preferred_grade.unwrap_or("-"),
        section = %entry.section_name,
        distance = selection_distance(entry, required),
        "selected section"
    );
    Ok(entry)
}
