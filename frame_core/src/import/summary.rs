//! Import outcome tallies.
//!
//! Every element the importer attempts ends up in exactly one bucket:
//! succeeded, failed (no section match, host call failed, layer aborted)
//! or skipped (unusable geometry, unknown layer).

use std::collections::BTreeMap;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FrameError, FrameResult};
use crate::rules::LayerClass;

/// Succeeded / failed / skipped counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTally {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ImportTally {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

impl AddAssign for ImportTally {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Outcome of one CAD layer on one story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub layer: String,
    pub class: LayerClass,
    pub tally: ImportTally,
    /// Section name -> elements created with it
    pub sections_used: BTreeMap<String, usize>,
    /// Error code -> occurrences, for failed and skipped elements
    pub issues: BTreeMap<String, usize>,
    /// Set when the whole layer was abandoned
    pub aborted: Option<FrameError>,
}

impl LayerSummary {
    pub fn new(layer: impl Into<String>, class: LayerClass) -> Self {
        LayerSummary {
            layer: layer.into(),
            class,
            tally: ImportTally::default(),
            sections_used: BTreeMap::new(),
            issues: BTreeMap::new(),
            aborted: None,
        }
    }

    /// Tally one element outcome.
    ///
    /// Errors that are not local to the element are handed back so the
    /// caller can abandon the layer.
    pub fn record(&mut self, outcome: FrameResult<String>) -> FrameResult<()> {
        match outcome {
            Ok(section) => {
                self.tally.succeeded += 1;
                *self.sections_used.entry(section).or_default() += 1;
                Ok(())
            }
            Err(err) if err.is_entity_local() => {
                if err.is_skip() {
                    self.tally.skipped += 1;
                } else {
                    self.tally.failed += 1;
                }
                *self.issues.entry(err.error_code().to_string()).or_default() += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Mark the layer abandoned; `remaining` elements count as failed
    pub fn abort(&mut self, err: FrameError, remaining: usize) {
        self.tally.failed += remaining;
        *self.issues.entry(err.error_code().to_string()).or_default() += remaining;
        self.aborted = Some(err);
    }

    /// Count `count` elements as skipped for `reason`
    pub fn skip_all(&mut self, count: usize, reason: &str) {
        self.tally.skipped += count;
        *self.issues.entry(reason.to_string()).or_default() += count;
    }
}

/// Outcome of one story pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    pub story_index: u32,
    pub story_label: String,
    pub wall_grade: Option<String>,
    pub beam_slab_grade: Option<String>,
    pub layers: Vec<LayerSummary>,
    pub tally: ImportTally,
    pub cancelled: bool,
}

impl StorySummary {
    pub fn new(story_index: u32, story_label: impl Into<String>) -> Self {
        StorySummary {
            story_index,
            story_label: story_label.into(),
            wall_grade: None,
            beam_slab_grade: None,
            layers: Vec::new(),
            tally: ImportTally::default(),
            cancelled: false,
        }
    }

    pub fn push_layer(&mut self, layer: LayerSummary) {
        self.tally += layer.tally;
        self.layers.push(layer);
    }

    pub fn layer(&self, name: &str) -> Option<&LayerSummary> {
        self.layers.iter().find(|l| l.layer == name)
    }
}

/// Outcome of a whole import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stories: Vec<StorySummary>,
    pub totals: ImportTally,
    pub cancelled: bool,
}

impl Default for ImportSummary {
    fn default() -> Self {
        ImportSummary {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            stories: Vec::new(),
            totals: ImportTally::default(),
            cancelled: false,
        }
    }
}

impl ImportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_story(&mut self, story: StorySummary) {
        self.totals += story.tally;
        self.cancelled |= story.cancelled;
        self.stories.push(story);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// `Cancelled` if the run stopped early
    pub fn check_cancelled(&self) -> FrameResult<()> {
        if self.cancelled {
            Err(FrameError::Cancelled {
                processed: self.totals.total(),
            })
        } else {
            Ok(())
        }
    }
}
