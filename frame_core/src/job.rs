//! # Job Files
//!
//! A job bundles everything an import run needs besides the CAD geometry
//! and the host. Jobs serialize to `.pfj` files as human-readable JSON.
//!
//! ```text
//! JobFile
//! ├── meta: JobMetadata (version, id, engineer, job info, timestamps)
//! ├── config: BuildingConfig (zone, floors, dimension tables, tolerances)
//! └── grade_schedule: GradeSchedule (wall grade per run of floors)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use frame_core::job::JobFile;
//! use frame_core::grades::GradeScheduleRow;
//!
//! let mut job = JobFile::new("Jane Engineer", "26-014", "Skyline Developers");
//! job.grade_schedule.rows.push(GradeScheduleRow::new(1, 10, "M40"));
//! assert!(job.validate().is_ok());
//!
//! let json = serde_json::to_string_pretty(&job).unwrap();
//! assert!(json.contains("Zone III"));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ElementFamily;
use crate::config::BuildingConfig;
use crate::errors::FrameResult;
use crate::grades::GradeSchedule;
use crate::import::StoryPass;

/// Current schema version for .pfj files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root job container, serialized to `.pfj` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFile {
    pub meta: JobMetadata,

    #[serde(default)]
    pub config: BuildingConfig,

    #[serde(default)]
    pub grade_schedule: GradeSchedule,
}

impl JobFile {
    /// Create a job with default building configuration and an empty schedule.
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        JobFile {
            meta: JobMetadata {
                version: SCHEMA_VERSION.to_string(),
                id: Uuid::new_v4(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            config: BuildingConfig::default(),
            grade_schedule: GradeSchedule::default(),
        }
    }

    /// Validate the configuration and that the schedule covers every floor
    pub fn validate(&self) -> FrameResult<()> {
        self.config.validate()?;
        self.grade_schedule.validate(self.config.total_floor_count)
    }
}

impl Default for JobFile {
    fn default() -> Self {
        JobFile::new("", "", "")
    }
}

/// Job metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Stable identifier, kept across saves
    pub id: Uuid,

    /// Name of the responsible engineer
    pub engineer: String,

    /// Job/project number
    pub job_id: String,

    pub client: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// CAD model as pre-read by the CAD reader, plus the template's section names.
///
/// This is the input format of offline runs; a live host supplies the
/// section names itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub sections: BTreeMap<ElementFamily, Vec<String>>,
    pub stories: Vec<StoryPass>,
}
