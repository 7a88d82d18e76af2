//! Section-name grammar.
//!
//! | Family | Pattern | Example |
//! |---|---|---|
//! | Gravity beam | `<prefix><width cm>X<depth cm>M<grade>` | `B20X45M30` |
//! | Main beam | `<prefix><width cm>X<depth cm>M<grade>` | `MB23X60M35` |
//! | Wall | `<prefix><thickness cm>X<length cm>M<grade>` | `W20X300M40` |
//! | Slab | `<prefix><thickness mm>SM<grade>` | `S150SM30` |
//!
//! Centimeter values may have decimals and are rounded to the nearest
//! millimeter. The dimension separator `X` and the grade marker `M` are
//! accepted in either case; prefixes are matched exactly.

use serde::{Deserialize, Serialize};

use super::{CatalogEntry, ElementFamily};

/// Prefixes that distinguish the section families in the model template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionNaming {
    pub gravity_beam_prefix: String,
    pub main_beam_prefix: String,
    pub wall_prefix: String,
    pub slab_prefix: String,
}

impl Default for SectionNaming {
    fn default() -> Self {
        SectionNaming {
            gravity_beam_prefix: "B".to_string(),
            main_beam_prefix: "MB".to_string(),
            wall_prefix: "W".to_string(),
            slab_prefix: "S".to_string(),
        }
    }
}

impl SectionNaming {
    /// Prefix for a family
    pub fn prefix(&self, family: ElementFamily) -> &str {
        match family {
            ElementFamily::GravityBeam => &self.gravity_beam_prefix,
            ElementFamily::MainBeam => &self.main_beam_prefix,
            ElementFamily::Wall => &self.wall_prefix,
            ElementFamily::Slab => &self.slab_prefix,
        }
    }

    /// Name of a synthesized slab section (no grade)
    pub fn fallback_slab_name(&self, thickness_mm: u32) -> String {
        format!("{}{}S", self.slab_prefix, thickness_mm)
    }
}

/// Strip any grade marker, keeping the numeric part ("M35" -> "35").
///
/// Returns an empty string when there are no digits.
pub fn normalize_grade(grade: &str) -> String {
    let numeric: String = grade
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if numeric.chars().any(|c| c.is_ascii_digit()) {
        numeric
    } else {
        String::new()
    }
}

/// Grade value as an integer, if the label carries one ("M45" -> 45)
pub fn grade_value(grade: &str) -> Option<u32> {
    let normalized = normalize_grade(grade);
    let whole = normalized.split('.').next().unwrap_or("");
    whole.parse().ok()
}

/// Split `s` at the first occurrence of `marker`, ignoring ASCII case
fn split_marker<'a>(s: &'a str, marker: &str) -> Option<(&'a str, &'a str)> {
    let pos = s.to_ascii_uppercase().find(&marker.to_ascii_uppercase())?;
    Some((&s[..pos], &s[pos + marker.len()..]))
}

fn parse_positive(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Largest section dimension a name may encode (mm)
pub const MAX_SECTION_MM: u32 = 100_000;

/// Round to whole millimeters; `None` for zero or oversized values
fn whole_mm(mm: f64) -> Option<u32> {
    let rounded = mm.round();
    (1.0..=f64::from(MAX_SECTION_MM)).contains(&rounded).then_some(rounded as u32)
}

/// Centimeters to whole millimeters, rounded to nearest
fn cm_to_mm(cm: f64) -> Option<u32> {
    whole_mm(cm * 10.0)
}

/// Grade text after the `M` marker; must be purely numeric
fn parse_grade(s: &str) -> Option<String> {
    let trimmed = s.trim();
    let valid = !trimmed.is_empty()
        && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.')
        && trimmed.chars().any(|c| c.is_ascii_digit());
    valid.then(|| trimmed.to_string())
}

/// Parse `<w>X<d>M<grade>` (after the prefix) into (w_mm, d_mm, grade)
fn parse_two_dimension_body(body: &str) -> Option<(u32, u32, String)> {
    let (first, rest) = split_marker(body, "X")?;
    let (second, grade) = split_marker(rest, "M")?;
    let first_mm = cm_to_mm(parse_positive(first)?)?;
    let second_mm = cm_to_mm(parse_positive(second)?)?;
    Some((first_mm, second_mm, parse_grade(grade)?))
}

/// Parse one section name as a member of `family`.
///
/// Returns `None` when the name does not follow that family's pattern.
pub fn parse_section_name(name: &str, family: ElementFamily, naming: &SectionNaming) -> Option<CatalogEntry> {
    let body = name.trim().strip_prefix(naming.prefix(family))?;

    match family {
        ElementFamily::GravityBeam | ElementFamily::MainBeam => {
            let (width_mm, depth_mm, grade) = parse_two_dimension_body(body)?;
            Some(CatalogEntry {
                section_name: name.trim().to_string(),
                family,
                width_mm: Some(width_mm),
                depth_or_thickness_mm: depth_mm,
                grade: Some(grade),
            })
        }
        ElementFamily::Wall => {
            let (thickness_mm, length_mm, grade) = parse_two_dimension_body(body)?;
            Some(CatalogEntry {
                section_name: name.trim().to_string(),
                family,
                width_mm: Some(length_mm),
                depth_or_thickness_mm: thickness_mm,
                grade: Some(grade),
            })
        }
        ElementFamily::Slab => {
            let (thickness, grade) = split_marker(body, "SM")?;
            let thickness_mm = whole_mm(parse_positive(thickness)?)?;
            Some(CatalogEntry {
                section_name: name.trim().to_string(),
                family,
                width_mm: None,
                depth_or_thickness_mm: thickness_mm,
                grade: Some(parse_grade(grade)?),
            })
        }
    }
}

/// Parse a name of unknown family.
///
/// Families are tried main beam first so a longer main-beam prefix wins
/// over a gravity-beam prefix it starts with.
pub fn classify_section_name(name: &str, naming: &SectionNaming) -> Option<CatalogEntry> {
    let mut order = ElementFamily::ALL;
    order.sort_by_key(|f| std::cmp::Reverse(naming.prefix(*f).len()));
    order
        .into_iter()
        .find_map(|family| parse_section_name(name, family, naming))
}
