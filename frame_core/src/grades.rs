//! # Grade Schedule
//!
//! Concrete grades are entered as a bottom-to-top list of rows, each
//! covering a run of floors with one wall grade:
//!
//! ```text
//! starting_floor  floor_count  wall_grade
//!              1            3  M45         -> floors 1..=3
//!              4            7  M30         -> floors 4..=10
//! ```
//!
//! Beams and slabs on a story use a derived grade: 70% of the wall grade,
//! rounded up to the next multiple of 5, never below M30.

use serde::{Deserialize, Serialize};

use crate::catalog::grade_value;
use crate::errors::{FrameError, FrameResult};

/// Lowest beam/slab grade value
pub const MIN_BEAM_SLAB_GRADE: u32 = 30;

/// One row of the grade schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeScheduleRow {
    /// First floor of the run (1-based)
    pub starting_floor: u32,
    pub floor_count: u32,
    /// Wall grade label ("M45")
    pub wall_grade: String,
}

impl GradeScheduleRow {
    pub fn new(starting_floor: u32, floor_count: u32, wall_grade: impl Into<String>) -> Self {
        GradeScheduleRow {
            starting_floor,
            floor_count,
            wall_grade: wall_grade.into(),
        }
    }
}

/// Per-story grade lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeSchedule {
    pub rows: Vec<GradeScheduleRow>,
}

impl GradeSchedule {
    pub fn new(rows: Vec<GradeScheduleRow>) -> Self {
        GradeSchedule { rows }
    }

    /// Floors covered by all rows
    pub fn covered_floors(&self) -> u64 {
        self.rows.iter().map(|r| u64::from(r.floor_count)).sum()
    }

    /// Check the rows partition floors `1..=total_floors` without gaps.
    pub fn validate(&self, total_floors: u32) -> FrameResult<()> {
        let mut next_floor: u64 = 1;
        for (i, row) in self.rows.iter().enumerate() {
            if row.floor_count == 0 {
                return Err(FrameError::schedule_mismatch(format!(
                    "row {} ({}) covers no floors",
                    i + 1,
                    row.wall_grade
                )));
            }
            if u64::from(row.starting_floor) != next_floor {
                return Err(FrameError::schedule_mismatch(format!(
                    "row {} starts at floor {}, expected floor {}",
                    i + 1,
                    row.starting_floor,
                    next_floor
                )));
            }
            next_floor += u64::from(row.floor_count);
        }

        let covered = self.covered_floors();
        if covered != u64::from(total_floors) {
            return Err(FrameError::schedule_mismatch(format!(
                "schedule covers {covered} floors, building has {total_floors}"
            )));
        }
        Ok(())
    }

    /// Wall grade for a 1-based story; `None` outside the schedule
    pub fn wall_grade_for_story(&self, story: u32) -> Option<&str> {
        if story == 0 {
            return None;
        }
        let mut top: u64 = 0;
        for row in &self.rows {
            top += u64::from(row.floor_count);
            if u64::from(story) <= top {
                return Some(row.wall_grade.as_str());
            }
        }
        None
    }

    /// Beam/slab grade for a 1-based story ("M35")
    pub fn beam_slab_grade_for_story(&self, story: u32) -> Option<String> {
        self.wall_grade_for_story(story).and_then(derive_beam_slab_grade)
    }
}

/// Beam/slab grade from a wall grade label.
///
/// `max(30, ceil5(0.7 * wall))` in integer arithmetic. `None` when the
/// label carries no number.
pub fn derive_beam_slab_grade(wall_grade: &str) -> Option<String> {
    let wall = u64::from(grade_value(wall_grade)?);
    let rounded = (wall * 7).div_ceil(50) * 5;
    Some(format!("M{}", rounded.max(u64::from(MIN_BEAM_SLAB_GRADE))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> GradeSchedule {
        GradeSchedule::new(vec![GradeScheduleRow::new(1, 3, "M45"), GradeScheduleRow::new(4, 7, "M30")])
    }

    #[test]
    fn test_story_lookup() {
        let s = schedule();
        assert_eq!(s.wall_grade_for_story(1), Some("M45"));
        assert_eq!(s.wall_grade_for_story(2), Some("M45"));
        assert_eq!(s.wall_grade_for_story(3), Some("M45"));
        assert_eq!(s.wall_grade_for_story(4), Some("M30"));
        assert_eq!(s.wall_grade_for_story(10), Some("M30"));
        assert_eq!(s.wall_grade_for_story(0), None);
        assert_eq!(s.wall_grade_for_story(11), None);
    }

    #[test]
    fn test_beam_slab_grade() {
        let s = schedule();
        assert_eq!(s.beam_slab_grade_for_story(2).as_deref(), Some("M35"));
        assert_eq!(s.beam_slab_grade_for_story(5).as_deref(), Some("M30"));
        assert_eq!(s.beam_slab_grade_for_story(11), None);
    }

    #[test]
    fn test_derived_grade_rounds_up() {
        assert_eq!(derive_beam_slab_grade("M40").as_deref(), Some("M30"));
        assert_eq!(derive_beam_slab_grade("M50").as_deref(), Some("M35"));
        assert_eq!(derive_beam_slab_grade("M55").as_deref(), Some("M40"));
        assert_eq!(derive_beam_slab_grade("M60").as_deref(), Some("M45"));
        assert_eq!(derive_beam_slab_grade("70").as_deref(), Some("M50"));
        assert_eq!(derive_beam_slab_grade("grade"), None);
    }

    #[test]
    fn test_derived_grade_multiple_of_five() {
        for wall in 10..=100 {
            let grade = derive_beam_slab_grade(&format!("M{wall}")).unwrap();
            let value = grade_value(&grade).unwrap();
            assert_eq!(value % 5, 0);
            assert!(value >= MIN_BEAM_SLAB_GRADE);
            assert!(value * 10 >= wall * 7, "M{wall} -> {grade}");
        }
    }

    #[test]
    fn test_validate() {
        assert!(schedule().validate(10).is_ok());

        let err = schedule().validate(12).unwrap_err();
        assert_eq!(err.error_code(), "SCHEDULE_MISMATCH");

        let gap = GradeSchedule::new(vec![GradeScheduleRow::new(1, 3, "M45"), GradeScheduleRow::new(5, 7, "M30")]);
        assert!(gap.validate(10).is_err());

        let empty_row = GradeSchedule::new(vec![GradeScheduleRow::new(1, 0, "M45"), GradeScheduleRow::new(1, 10, "M30")]);
        assert!(empty_row.validate(10).is_err());
    }

    #[test]
    fn test_validate_huge_floor_count() {
        let s = GradeSchedule::new(vec![
            GradeScheduleRow::new(1, u32::MAX, "M45"),
            GradeScheduleRow::new(2, 1, "M30"),
        ]);
        let err = s.validate(10).unwrap_err();
        assert_eq!(err.error_code(), "SCHEDULE_MISMATCH");

        let s = GradeSchedule::new(vec![GradeScheduleRow::new(1, u32::MAX, "M45"), GradeScheduleRow::new(u32::MAX, 1, "M30")]);
        assert!(s.validate(u32::MAX).is_err());
        assert_eq!(s.covered_floors(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_story_lookup_past_u32_range() {
        let s = GradeSchedule::new(vec![
            GradeScheduleRow::new(1, 10, "M45"),
            GradeScheduleRow::new(11, u32::MAX, "M30"),
        ]);
        assert_eq!(s.wall_grade_for_story(20), Some("M30"));
        assert_eq!(s.wall_grade_for_story(u32::MAX), Some("M30"));
    }

    #[test]
    fn test_derived_grade_extreme_value() {
        assert_eq!(derive_beam_slab_grade("M999999999").as_deref(), Some("M700000000"));
        let max = format!("M{}", u32::MAX);
        assert_eq!(derive_beam_slab_grade(&max).as_deref(), Some("M3006477110"));
    }

    #[test]
    fn test_empty_schedule_is_safe() {
        let s = GradeSchedule::default();
        assert_eq!(s.wall_grade_for_story(1), None);
        assert_eq!(s.beam_slab_grade_for_story(1), None);
        assert!(s.validate(1).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&schedule()).unwrap();
        let back: GradeSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schedule());
    }
}
