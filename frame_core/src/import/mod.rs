//! # Import Driver
//!
//! Turns the CAD entities of one story into host primitives:
//!
//! ```text
//! StoryPass
//!   └── layers, in order of first appearance
//!         classify_layer ─► dimension rules ─► selector ─► host calls
//! ```
//!
//! - Beams become frames at the story elevation.
//! - Walls become vertical area panels from the story below up to the
//!   story elevation.
//! - Slabs become area panels over their cleaned boundary.
//!
//! Coincident points are created once and shared between elements.
//! Element failures are tallied and the batch continues; a layer whose
//! family has no catalog entries is abandoned as a whole. Cancellation is
//! polled between entities.

pub mod host;
pub mod summary;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use host::{RecordedArea, RecordedFrame, RecordingHost, StructuralHost};
pub use summary::{ImportSummary, ImportTally, LayerSummary, StorySummary};

use crate::catalog::{CatalogCache, ElementFamily, SectionCatalog};
use crate::config::{BuildingConfig, FloorType};
use crate::errors::{FrameError, FrameResult};
use crate::geometry::{clean_boundary, flatten_boundary_path, BoundaryPolygon, BoundarySegment, Point2, Point3};
use crate::grades::GradeSchedule;
use crate::rules::{self, classify_layer, LayerClass, RequiredDimensions, SlabGeometry, SlabKind, WallType};
use crate::selector;
use crate::units::Meters;

/// Grid used to recognize coincident host points (meters)
const POINT_KEY_STEP_M: f64 = 1e-6;

/// Geometry of one CAD entity, in input units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CadGeometry {
    Line {
        start: Point2,
        end: Point2,
    },
    Polyline {
        points: Vec<Point2>,
        #[serde(default)]
        closed: bool,
    },
    /// Filled region; one boundary per path
    Hatch { paths: Vec<Vec<BoundarySegment>> },
}

impl CadGeometry {
    /// Straight segments for beams and walls
    pub fn segments(&self) -> FrameResult<Vec<(Point2, Point2)>> {
        match self {
            CadGeometry::Line { start, end } => Ok(vec![(*start, *end)]),
            CadGeometry::Polyline { points, closed } => {
                if points.len() < 2 {
                    return Err(FrameError::geometry_invalid(format!(
                        "polyline has {} vertices",
                        points.len()
                    )));
                }
                let mut segments: Vec<_> = points.windows(2).map(|w| (w[0], w[1])).collect();
                if *closed && points.len() > 2 {
                    segments.push((points[points.len() - 1], points[0]));
                }
                Ok(segments)
            }
            CadGeometry::Hatch { .. } => Err(FrameError::geometry_invalid("hatch on a beam or wall layer")),
        }
    }

    /// Raw boundaries for slabs, before cleanup
    pub fn boundaries(&self) -> FrameResult<Vec<Vec<Point2>>> {
        match self {
            CadGeometry::Line { .. } => Err(FrameError::geometry_invalid("line on a slab layer")),
            CadGeometry::Polyline { points, closed } => {
                let mut boundary = points.clone();
                if *closed {
                    // Closing vertex; cleanup drops it again if redundant
                    if let Some(first) = points.first() {
                        boundary.push(*first);
                    }
                }
                Ok(vec![boundary])
            }
            CadGeometry::Hatch { paths } => Ok(paths.iter().map(|path| flatten_boundary_path(path)).collect()),
        }
    }
}

/// One CAD entity and the layer it was drawn on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadEntity {
    pub layer: String,
    pub geometry: CadGeometry,
}

impl CadEntity {
    pub fn new(layer: impl Into<String>, geometry: CadGeometry) -> Self {
        CadEntity {
            layer: layer.into(),
            geometry,
        }
    }
}

/// Everything the CAD reader delivers for one story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPass {
    /// 1-based story number, as used by the grade schedule
    pub story_index: u32,
    /// Story name in the host model
    pub story_label: String,
    /// Top of the story (meters)
    pub elevation_m: f64,
    pub story_height_m: f64,
    #[serde(default)]
    pub floor_type: FloorType,
    pub entities: Vec<CadEntity>,
}

/// Host points already created, keyed by position
#[derive(Debug, Default)]
struct PointRegistry {
    names: HashMap<(i64, i64, i64), String>,
}

impl PointRegistry {
    fn key(p: Point3) -> (i64, i64, i64) {
        (
            (p.x / POINT_KEY_STEP_M).round() as i64,
            (p.y / POINT_KEY_STEP_M).round() as i64,
            (p.z / POINT_KEY_STEP_M).round() as i64,
        )
    }

    fn get_or_add<H: StructuralHost>(&mut self, host: &mut H, p: Point3) -> FrameResult<String> {
        let key = Self::key(p);
        if let Some(name) = self.names.get(&key) {
            return Ok(name.clone());
        }
        let name = host
            .add_point(p)
            .map_err(|code| FrameError::host_call_failed("add_point", code))?;
        self.names.insert(key, name.clone());
        Ok(name)
    }
}

/// What every element on a layer turns into
#[derive(Debug, Clone, Copy)]
enum LayerPlan {
    Linear(LinearPlan),
    Slab(SlabKind),
}

/// Elements placed along line segments
#[derive(Debug, Clone, Copy)]
enum LinearPlan {
    /// Beam dimensions do not depend on the segment
    Beam(RequiredDimensions),
    Wall { wall_type: WallType, floating: bool },
}

/// Per-story values shared by all layers
struct StoryContext<'s> {
    story: &'s StoryPass,
    wall_grade: Option<String>,
    beam_slab_grade: Option<String>,
    /// Wall segments for cantilever support detection
    supports: Vec<(Point2, Point2)>,
}

/// Group entities by layer, keeping first-appearance order
fn group_by_layer(entities: &[CadEntity]) -> Vec<(&str, Vec<&CadEntity>)> {
    let mut groups: Vec<(&str, Vec<&CadEntity>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for entity in entities {
        let layer = entity.layer.as_str();
        let i = *index.entry(layer).or_insert_with(|| {
            groups.push((layer, Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(entity);
    }
    groups
}

fn check_naming(config: &BuildingConfig, cache: &CatalogCache) -> FrameResult<()> {
    if cache.naming() != &config.naming {
        return Err(FrameError::invalid_input(
            "naming",
            format!("{:?}", cache.naming()),
            "Catalog cache was built with a different section naming than the configuration",
        ));
    }
    Ok(())
}

/// Imports story passes into a structural host.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use std::sync::atomic::AtomicBool;
/// use frame_core::catalog::{CatalogCache, ElementFamily};
/// use frame_core::config::BuildingConfig;
/// use frame_core::geometry::Point2;
/// use frame_core::grades::{GradeSchedule, GradeScheduleRow};
/// use frame_core::import::{CadEntity, CadGeometry, Importer, RecordingHost, StoryPass};
///
/// let host = RecordingHost::new(BTreeMap::from([
///     (ElementFamily::GravityBeam, vec!["B20X45M30".to_string()]),
/// ]));
/// let schedule = GradeSchedule::new(vec![GradeScheduleRow::new(1, 10, "M40")]);
/// let cache = CatalogCache::default();
/// let mut importer = Importer::new(BuildingConfig::default(), schedule, &cache, host).unwrap();
///
/// let story = StoryPass {
///     story_index: 1,
///     story_label: "Story1".to_string(),
///     elevation_m: 3.0,
///     story_height_m: 3.0,
///     floor_type: Default::default(),
///     entities: vec![CadEntity::new(
///         "B-Internal Gravity",
///         CadGeometry::Line { start: Point2::new(0.0, 0.0), end: Point2::new(4000.0, 0.0) },
///     )],
/// };
///
/// let summary = importer.import_story(&story, &AtomicBool::new(false));
/// assert_eq!(summary.tally.succeeded, 1);
/// assert_eq!(importer.host().frames[0].section, "B20X45M30");
/// ```
pub struct Importer<H: StructuralHost> {
    config: BuildingConfig,
    schedule: GradeSchedule,
    catalog: Arc<SectionCatalog>,
    host: H,
    points: PointRegistry,
}

impl<H: StructuralHost> Importer<H> {
    /// Validate the inputs and load the catalog through `cache`.
    ///
    /// A schedule that does not cover the building's floors is rejected
    /// here, before any geometry is touched. The cache must parse names
    /// with the configured section naming.
    pub fn new(config: BuildingConfig, schedule: GradeSchedule, cache: &CatalogCache, host: H) -> FrameResult<Self> {
        config.validate()?;
        schedule.validate(config.total_floor_count)?;
        check_naming(&config, cache)?;
        let catalog = cache.get_or_load(&host);

        Ok(Importer {
            config,
            schedule,
            catalog,
            host,
            points: PointRegistry::default(),
        })
    }

    pub fn config(&self) -> &BuildingConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Re-query the host's sections, e.g. after the template changed
    pub fn reload_catalog(&mut self, cache: &CatalogCache) -> FrameResult<()> {
        check_naming(&self.config, cache)?;
        self.catalog = cache.reload(&self.host);
        Ok(())
    }

    /// Import every story in order, stopping early on cancellation
    pub fn run(&mut self, stories: &[StoryPass], cancel: &AtomicBool) -> ImportSummary {
        let mut summary = ImportSummary::new();
        tracing::info!(run_id = %summary.run_id, stories = stories.len(), "starting import");

        for story in stories {
            let story_summary = self.import_story(story, cancel);
            let stop = story_summary.cancelled;
            summary.push_story(story_summary);
            if stop {
                break;
            }
        }

        summary.finish();
        tracing::info!(
            run_id = %summary.run_id,
            succeeded = summary.totals.succeeded,
            failed = summary.totals.failed,
            skipped = summary.totals.skipped,
            cancelled = summary.cancelled,
            "import finished"
        );
        summary
    }

    /// Import one story.
    pub fn import_story(&mut self, story: &StoryPass, cancel: &AtomicBool) -> StorySummary {
        let ctx = self.story_context(story);
        let mut summary = StorySummary::new(story.story_index, &story.story_label);
        summary.wall_grade = ctx.wall_grade.clone();
        summary.beam_slab_grade = ctx.beam_slab_grade.clone();

        for (layer, entities) in group_by_layer(&story.entities) {
            let (layer_summary, cancelled) = self.import_layer(&ctx, layer, &entities, cancel);
            tracing::info!(
                story = %story.story_label,
                layer,
                succeeded = layer_summary.tally.succeeded,
                failed = layer_summary.tally.failed,
                skipped = layer_summary.tally.skipped,
                "layer imported"
            );
            summary.push_layer(layer_summary);
            if cancelled {
                tracing::info!(story = %story.story_label, "import cancelled");
                summary.cancelled = true;
                break;
            }
        }

        tracing::info!(
            story = %story.story_label,
            succeeded = summary.tally.succeeded,
            failed = summary.tally.failed,
            skipped = summary.tally.skipped,
            "story imported"
        );
        summary
    }

    fn story_context<'s>(&self, story: &'s StoryPass) -> StoryContext<'s> {
        let wall_grade = self.schedule.wall_grade_for_story(story.story_index).map(str::to_string);
        let beam_slab_grade = self.schedule.beam_slab_grade_for_story(story.story_index);
        if wall_grade.is_none() {
            tracing::warn!(
                story = %story.story_label,
                index = story.story_index,
                "story outside grade schedule, selecting sections without grade preference"
            );
        }

        let supports = if self.config.detect_cantilever_support {
            story
                .entities
                .iter()
                .filter(|e| matches!(classify_layer(&e.layer), LayerClass::Wall { .. }))
                .filter_map(|e| e.geometry.segments().ok())
                .flatten()
                .collect()
        } else {
            Vec::new()
        };

        StoryContext {
            story,
            wall_grade,
            beam_slab_grade,
            supports,
        }
    }

    /// Catalog entries exist for `family`; main beams may borrow gravity sections
    fn check_family(&self, family: ElementFamily) -> FrameResult<()> {
        match self.catalog.require(family) {
            Err(_) if family == ElementFamily::MainBeam && !self.catalog.entries(ElementFamily::GravityBeam).is_empty() => {
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    fn plan_layer(&self, class: LayerClass, floor_type: FloorType) -> FrameResult<Option<LayerPlan>> {
        let plan = match class {
            LayerClass::Gravity(subtype) => LayerPlan::Linear(LinearPlan::Beam(rules::gravity_beam_dimensions(
                &self.config,
                floor_type,
                subtype,
            )?)),
            LayerClass::Main(subtype) => LayerPlan::Linear(LinearPlan::Beam(rules::main_beam_dimensions(
                &self.config,
                floor_type,
                subtype,
            ))),
            LayerClass::Wall { wall_type, floating } => LayerPlan::Linear(LinearPlan::Wall { wall_type, floating }),
            LayerClass::Slab(kind) => LayerPlan::Slab(kind),
            LayerClass::Unknown => return Ok(None),
        };
        Ok(Some(plan))
    }

    /// Import one layer; the flag is set when cancellation stopped it
    fn import_layer(
        &mut self,
        ctx: &StoryContext<'_>,
        layer: &str,
        entities: &[&CadEntity],
        cancel: &AtomicBool,
    ) -> (LayerSummary, bool) {
        let class = classify_layer(layer);
        let mut summary = LayerSummary::new(layer, class);

        let prepared = class
            .family()
            .map(|family| self.check_family(family))
            .transpose()
            .and_then(|_| self.plan_layer(class, ctx.story.floor_type));

        let plan = match prepared {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                tracing::debug!(layer, "unrecognized layer, skipping");
                summary.skip_all(entities.len(), "UNKNOWN_LAYER");
                return (summary, false);
            }
            Err(err) => {
                tracing::warn!(layer, error = %err, "layer aborted");
                summary.abort(err, entities.len());
                return (summary, false);
            }
        };

        for (i, entity) in entities.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return (summary, true);
            }
            if let Err(err) = self.import_entity(ctx, plan, &entity.geometry, &mut summary) {
                tracing::warn!(layer, error = %err, "layer aborted");
                summary.abort(err, entities.len() - i);
                break;
            }
        }
        (summary, false)
    }

    /// Place every element of one entity; errors returned here abort the layer
    fn import_entity(
        &mut self,
        ctx: &StoryContext<'_>,
        plan: LayerPlan,
        geometry: &CadGeometry,
        summary: &mut LayerSummary,
    ) -> FrameResult<()> {
        match plan {
            LayerPlan::Linear(linear) => {
                let segments = match geometry.segments() {
                    Ok(segments) => segments,
                    Err(err) => return self.record(summary, Err(err)),
                };
                for segment in segments {
                    let outcome = match linear {
                        LinearPlan::Beam(required) => self.place_beam(ctx, segment, &required),
                        LinearPlan::Wall { wall_type, floating } => self.place_wall(ctx, segment, wall_type, floating),
                    };
                    self.record(summary, outcome)?;
                }
            }
            LayerPlan::Slab(kind) => {
                let boundaries = match geometry.boundaries() {
                    Ok(boundaries) => boundaries,
                    Err(err) => return self.record(summary, Err(err)),
                };
                for boundary in boundaries {
                    let outcome = self.place_slab(ctx, &boundary, kind);
                    self.record(summary, outcome)?;
                }
            }
        }
        Ok(())
    }

    fn record(&self, summary: &mut LayerSummary, outcome: FrameResult<String>) -> FrameResult<()> {
        match &outcome {
            Err(err) if err.is_skip() => tracing::debug!(layer = %summary.layer, error = %err, "element skipped"),
            Err(err) if err.is_entity_local() => tracing::warn!(layer = %summary.layer, error = %err, "element failed"),
            _ => {}
        }
        summary.record(outcome)
    }

    fn point(&mut self, p: Point2, z: f64) -> FrameResult<String> {
        let lifted = Point3::from_plan(p, self.config.tolerances.unit_to_meter, z);
        self.points.get_or_add(&mut self.host, lifted)
    }

    fn select_section(&self, required: &RequiredDimensions, grade: Option<&str>) -> FrameResult<String> {
        Ok(selector::select(&self.catalog, required, grade)?.section_name.clone())
    }

    fn segment_length(&self, (a, b): (Point2, Point2)) -> FrameResult<Meters> {
        let length = a.distance_to(b);
        if length < self.config.tolerances.dedupe_epsilon {
            return Err(FrameError::geometry_invalid(format!("segment too short: {length:.3}")));
        }
        Ok(Meters::from_input_units(length, self.config.tolerances.unit_to_meter))
    }

    fn place_beam(
        &mut self,
        ctx: &StoryContext<'_>,
        segment: (Point2, Point2),
        required: &RequiredDimensions,
    ) -> FrameResult<String> {
        self.segment_length(segment)?;
        let section = self.select_section(required, ctx.beam_slab_grade.as_deref())?;

        let elevation = ctx.story.elevation_m;
        let start = self.point(segment.0, elevation)?;
        let end = self.point(segment.1, elevation)?;
        let frame = self
            .host
            .add_frame(&start, &end, &section, &ctx.story.story_label)
            .map_err(|code| FrameError::host_call_failed("add_frame", code))?;

        tracing::debug!(frame = %frame, section = %section, required = %required, "beam placed");
        Ok(section)
    }

    fn place_wall(
        &mut self,
        ctx: &StoryContext<'_>,
        segment: (Point2, Point2),
        wall_type: WallType,
        floating: bool,
    ) -> FrameResult<String> {
        let length = self.segment_length(segment)?;
        let required = rules::wall_dimensions(&self.config, wall_type, length, floating);
        let section = self.select_section(&required, ctx.wall_grade.as_deref())?;

        let top = ctx.story.elevation_m;
        let bottom = top - ctx.story.story_height_m;
        let (a, b) = segment;
        let corners = [
            self.point(a, bottom)?,
            self.point(b, bottom)?,
            self.point(b, top)?,
            self.point(a, top)?,
        ];
        let area = self
            .host
            .add_area(&corners, &section, &ctx.story.story_label)
            .map_err(|code| FrameError::host_call_failed("add_area", code))?;

        tracing::debug!(area = %area, section = %section, length = %length, "wall placed");
        Ok(section)
    }

    /// Cantilever span from a supporting wall edge, or the shortest edge
    fn cantilever_span(&self, ctx: &StoryContext<'_>, polygon: &BoundaryPolygon) -> Meters {
        polygon
            .find_support_edge(&ctx.supports, self.config.tolerances.closure_tolerance)
            .map(|edge| polygon.support_span(edge))
            .unwrap_or_else(|| polygon.min_edge())
    }

    fn place_slab(&mut self, ctx: &StoryContext<'_>, boundary: &[Point2], kind: SlabKind) -> FrameResult<String> {
        let polygon = clean_boundary(boundary, &self.config.tolerances)?;
        let span = match kind {
            SlabKind::Cantilever => self.cantilever_span(ctx, &polygon),
            _ => polygon.min_edge(),
        };
        let geometry = SlabGeometry {
            area: polygon.area(),
            span,
        };
        let required = rules::slab_dimensions(kind, self.config.floor(ctx.story.floor_type), geometry);
        let section = self.select_section(&required, ctx.beam_slab_grade.as_deref())?;

        let elevation = ctx.story.elevation_m;
        let corners = polygon
            .points()
            .iter()
            .map(|p| self.point(*p, elevation))
            .collect::<FrameResult<Vec<_>>>()?;
        let area = self
            .host
            .add_area(&corners, &section, &ctx.story.story_label)
            .map_err(|code| FrameError::host_call_failed("add_area", code))?;

        tracing::debug!(area = %area, section = %section, slab_area = %geometry.area, span = %span, "slab placed");
        Ok(section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SectionSource;
    use crate::grades::GradeScheduleRow;
    use crate::rules::GravitySubtype;
    use std::collections::BTreeMap;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn host() -> RecordingHost {
        RecordingHost::new(BTreeMap::from([
            (
                ElementFamily::GravityBeam,
                names(&["B20X45M35", "B20X45M45", "B24X45M35", "B20X60M35"]),
            ),
            (ElementFamily::MainBeam, names(&["MB25X60M35", "MB20X55M35"])),
            (ElementFamily::Wall, names(&["W25X300M45", "W20X300M45", "W20X300M30"])),
            (ElementFamily::Slab, names(&["S150SM35", "S125SM35", "S150SM45", "S200SM35"])),
        ]))
    }

    fn schedule() -> GradeSchedule {
        GradeSchedule::new(vec![GradeScheduleRow::new(1, 3, "M45"), GradeScheduleRow::new(4, 7, "M30")])
    }

    fn importer(host: RecordingHost) -> Importer<RecordingHost> {
        Importer::new(BuildingConfig::default(), schedule(), &CatalogCache::default(), host).unwrap()
    }

    fn line(layer: &str, a: (f64, f64), b: (f64, f64)) -> CadEntity {
        CadEntity::new(
            layer,
            CadGeometry::Line {
                start: Point2::new(a.0, a.1),
                end: Point2::new(b.0, b.1),
            },
        )
    }

    fn rect(layer: &str, w: f64, h: f64) -> CadEntity {
        CadEntity::new(
            layer,
            CadGeometry::Polyline {
                points: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(w, 0.0),
                    Point2::new(w, h),
                    Point2::new(0.0, h),
                ],
                closed: true,
            },
        )
    }

    fn story(index: u32, entities: Vec<CadEntity>) -> StoryPass {
        StoryPass {
            story_index: index,
            story_label: format!("Story{index}"),
            elevation_m: 3.0 * index as f64,
            story_height_m: 3.0,
            floor_type: FloorType::Typical,
            entities,
        }
    }

    fn no_cancel() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_end_to_end_story() {
        let mut importer = importer(host());
        let pass = story(
            2,
            vec![
                line("B-Internal Gravity", (0.0, 0.0), (4000.0, 0.0)),
                rect("Slab", 4000.0, 5000.0),
                line("W-Core Wall", (0.0, 0.0), (0.0, 5000.0)),
            ],
        );

        let summary = importer.import_story(&pass, &no_cancel());
        assert_eq!(summary.wall_grade.as_deref(), Some("M45"));
        assert_eq!(summary.beam_slab_grade.as_deref(), Some("M35"));
        assert_eq!(summary.tally, ImportTally { succeeded: 3, failed: 0, skipped: 0 });

        let host = importer.host();
        // 200 wide (Zone III), 450 deep (configured), grade M35
        assert_eq!(host.frames[0].section, "B20X45M35");
        // 20 m2 -> 150 mm
        assert_eq!(host.areas[0].section, "S150SM35");
        // Core wall, 10 typical floors, Zone III -> 250 mm, wall grade M45
        assert_eq!(host.areas[1].section, "W25X300M45");
        assert_eq!(host.areas[1].story, "Story2");
    }

    #[test]
    fn test_points_are_shared() {
        let mut importer = importer(host());
        let pass = story(
            2,
            vec![
                line("B-Internal Gravity", (0.0, 0.0), (4000.0, 0.0)),
                rect("Slab", 4000.0, 5000.0),
                line("W-Core Wall", (0.0, 0.0), (0.0, 5000.0)),
            ],
        );
        importer.import_story(&pass, &no_cancel());

        let host = importer.host();
        // 4 slab corners at the story level plus 2 wall corners below it
        assert_eq!(host.points.len(), 6);
        let beam = &host.frames[0];
        assert!(host.areas[0].points.contains(&beam.start));
        assert!(host.areas[0].points.contains(&beam.end));
    }

    #[test]
    fn test_wall_panel_spans_story_height() {
        let mut importer = importer(host());
        importer.import_story(&story(2, vec![line("Core Wall", (0.0, 0.0), (5000.0, 0.0))]), &no_cancel());

        let host = importer.host();
        let zs: Vec<f64> = host.areas[0].points.iter().map(|p| host.points[p].z).collect();
        assert_eq!(zs, vec![3.0, 3.0, 6.0, 6.0]);
        let x_end = host.points[&host.areas[0].points[1]].x;
        assert!((x_end - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_layers_in_first_appearance_order() {
        let mut importer = importer(host());
        let pass = story(
            1,
            vec![
                rect("Slab", 3000.0, 3000.0),
                line("Gravity", (0.0, 0.0), (3000.0, 0.0)),
                rect("Slab", 3000.0, 4000.0),
            ],
        );
        let summary = importer.import_story(&pass, &no_cancel());
        let layers: Vec<_> = summary.layers.iter().map(|l| l.layer.as_str()).collect();
        assert_eq!(layers, vec!["Slab", "Gravity"]);
        assert_eq!(summary.layer("Slab").unwrap().tally.succeeded, 2);
    }

    #[test]
    fn test_unknown_layer_skipped() {
        let mut importer = importer(host());
        let pass = story(1, vec![line("A-DIMENSIONS", (0.0, 0.0), (1.0, 0.0))]);
        let summary = importer.import_story(&pass, &no_cancel());
        let layer = summary.layer("A-DIMENSIONS").unwrap();
        assert_eq!(layer.class, LayerClass::Unknown);
        assert_eq!(layer.tally.skipped, 1);
        assert!(importer.host().points.is_empty());
    }

    #[test]
    fn test_invalid_geometry_skipped_batch_continues() {
        let mut importer = importer(host());
        let open = CadEntity::new(
            "Slab",
            CadGeometry::Polyline {
                points: vec![Point2::new(0.0, 0.0), Point2::new(4000.0, 0.0), Point2::new(4000.0, 4000.0)],
                closed: false,
            },
        );
        let pass = story(
            1,
            vec![
                open,
                line("Slab", (0.0, 0.0), (1.0, 1.0)),
                rect("Slab", 3000.0, 3000.0),
                line("Gravity", (0.0, 0.0), (0.0, 0.0)),
            ],
        );
        let summary = importer.import_story(&pass, &no_cancel());
        let slab = summary.layer("Slab").unwrap();
        assert_eq!(slab.tally, ImportTally { succeeded: 1, failed: 0, skipped: 2 });
        assert_eq!(slab.issues["GEOMETRY_INVALID"], 2);
        assert_eq!(summary.layer("Gravity").unwrap().tally.skipped, 1);
    }

    #[test]
    fn test_empty_wall_catalog_aborts_wall_layers_only() {
        let mut host = host();
        host.sections.remove(&ElementFamily::Wall);
        let mut importer = importer(host);
        let pass = story(
            1,
            vec![
                line("Core Wall", (0.0, 0.0), (5000.0, 0.0)),
                line("Core Wall", (0.0, 0.0), (0.0, 5000.0)),
                rect("Slab", 3000.0, 3000.0),
            ],
        );
        let summary = importer.import_story(&pass, &no_cancel());
        let walls = summary.layer("Core Wall").unwrap();
        assert_eq!(walls.tally.failed, 2);
        assert_eq!(walls.aborted.as_ref().map(|e| e.error_code()), Some("CATALOG_EMPTY"));
        assert_eq!(summary.layer("Slab").unwrap().tally.succeeded, 1);
    }

    #[test]
    fn test_slab_fallback_sections() {
        let mut host = host();
        host.sections.remove(&ElementFamily::Slab);
        let mut importer = importer(host);
        let summary = importer.import_story(&story(1, vec![rect("Slab", 4000.0, 5000.0)]), &no_cancel());
        assert_eq!(summary.tally.succeeded, 1);
        assert_eq!(importer.host().areas[0].section, "S150S");
    }

    #[test]
    fn test_main_beam_uses_gravity_sections_when_missing() {
        let mut host = host();
        host.sections.remove(&ElementFamily::MainBeam);
        let mut importer = importer(host);
        let summary = importer.import_story(&story(5, vec![line("Main Beam", (0.0, 0.0), (6000.0, 0.0))]), &no_cancel());
        assert_eq!(summary.tally.succeeded, 1);
        assert!(importer.host().frames[0].section.starts_with('B'));
    }

    #[test]
    fn test_host_failure_counted() {
        let mut host = host();
        host.fail_section("B20X45M35", -1);
        let mut importer = importer(host);
        let pass = story(
            2,
            vec![
                line("Gravity", (0.0, 0.0), (4000.0, 0.0)),
                line("Gravity", (0.0, 1000.0), (4000.0, 1000.0)),
                rect("Slab", 4000.0, 5000.0),
            ],
        );
        let summary = importer.import_story(&pass, &no_cancel());
        let gravity = summary.layer("Gravity").unwrap();
        assert_eq!(gravity.tally.failed, 2);
        assert_eq!(gravity.issues["HOST_CALL_FAILED"], 2);
        assert!(gravity.aborted.is_none());
        assert_eq!(summary.tally.succeeded, 1);
    }

    #[test]
    fn test_polyline_beam_segments() {
        let mut importer = importer(host());
        let beam = CadEntity::new(
            "Gravity",
            CadGeometry::Polyline {
                points: vec![Point2::new(0.0, 0.0), Point2::new(4000.0, 0.0), Point2::new(4000.0, 3000.0)],
                closed: false,
            },
        );
        let summary = importer.import_story(&story(2, vec![beam]), &no_cancel());
        assert_eq!(summary.tally.succeeded, 2);
        assert_eq!(importer.host().frames.len(), 2);
        assert_eq!(importer.host().points.len(), 3);
    }

    #[test]
    fn test_hatch_slab_with_arc_edge() {
        let mut importer = importer(host());
        let path = vec![
            BoundarySegment::Line {
                start: Point2::new(0.0, 0.0),
                end: Point2::new(4000.0, 0.0),
            },
            BoundarySegment::Arc {
                center: Point2::new(4000.0, 2000.0),
                radius: 2000.0,
                start_angle: -std::f64::consts::FRAC_PI_2,
                end_angle: std::f64::consts::FRAC_PI_2,
                counter_clockwise: true,
            },
            BoundarySegment::Line {
                start: Point2::new(4000.0, 4000.0),
                end: Point2::new(0.0, 4000.0),
            },
            BoundarySegment::Line {
                start: Point2::new(0.0, 4000.0),
                end: Point2::new(0.0, 0.0),
            },
        ];
        let hatch = CadEntity::new("Slab", CadGeometry::Hatch { paths: vec![path] });
        let summary = importer.import_story(&story(2, vec![hatch]), &no_cancel());
        assert_eq!(summary.tally.succeeded, 1);
        // 16 m2 square plus a half disc of ~6.28 m2 -> 22.2 m2 -> 160 mm band,
        // closest available is 150
        assert_eq!(importer.host().areas[0].section, "S150SM35");
        assert!(importer.host().areas[0].points.len() > 4);
    }

    #[test]
    fn test_cancellation_between_entities() {
        let mut importer = importer(host());
        let cancel = AtomicBool::new(true);
        let stories = vec![
            story(1, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]),
            story(2, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]),
        ];
        let summary = importer.run(&stories, &cancel);
        assert!(summary.cancelled);
        assert_eq!(summary.stories.len(), 1);
        assert_eq!(summary.totals.total(), 0);
        assert!(importer.host().frames.is_empty());
        assert_eq!(summary.check_cancelled().unwrap_err().error_code(), "CANCELLED");
    }

    /// Host that raises the cancel flag once it has created `limit` frames
    struct CancellingHost {
        inner: RecordingHost,
        cancel: Arc<AtomicBool>,
        limit: usize,
    }

    impl SectionSource for CancellingHost {
        fn section_names(&self, family: ElementFamily) -> Vec<String> {
            self.inner.section_names(family)
        }
    }

    impl StructuralHost for CancellingHost {
        fn add_point(&mut self, point: Point3) -> Result<String, i32> {
            self.inner.add_point(point)
        }

        fn add_frame(&mut self, start: &str, end: &str, section: &str, story: &str) -> Result<String, i32> {
            let name = self.inner.add_frame(start, end, section, story)?;
            if self.inner.frames.len() >= self.limit {
                self.cancel.store(true, Ordering::Relaxed);
            }
            Ok(name)
        }

        fn add_area(&mut self, points: &[String], section: &str, story: &str) -> Result<String, i32> {
            self.inner.add_area(points, section, story)
        }
    }

    #[test]
    fn test_cancellation_mid_layer_keeps_partial_tally() {
        let cancel = Arc::new(AtomicBool::new(false));
        let host = CancellingHost {
            inner: host(),
            cancel: Arc::clone(&cancel),
            limit: 2,
        };
        let mut importer = Importer::new(BuildingConfig::default(), schedule(), &CatalogCache::default(), host).unwrap();
        let stories = vec![
            story(
                1,
                vec![
                    line("Gravity", (0.0, 0.0), (4000.0, 0.0)),
                    line("Gravity", (0.0, 1000.0), (4000.0, 1000.0)),
                    line("Gravity", (0.0, 2000.0), (4000.0, 2000.0)),
                    rect("Slab", 4000.0, 5000.0),
                ],
            ),
            story(2, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]),
        ];

        let summary = importer.run(&stories, &cancel);
        assert!(summary.cancelled);
        assert_eq!(summary.stories.len(), 1);
        assert!(summary.stories[0].cancelled);
        assert_eq!(summary.stories[0].layers.len(), 1);
        assert_eq!(summary.stories[0].layers[0].tally.succeeded, 2);
        assert_eq!(summary.totals.succeeded, 2);
        assert_eq!(summary.totals.failed, 0);
        assert_eq!(importer.host().inner.frames.len(), 2);
        assert!(importer.host().inner.areas.is_empty());
        assert_eq!(summary.check_cancelled(), Err(FrameError::Cancelled { processed: 2 }));
    }

    #[test]
    fn test_cache_naming_must_match_config() {
        let mut config = BuildingConfig::default();
        config.naming.gravity_beam_prefix = "GB".to_string();

        let err = Importer::new(config.clone(), schedule(), &CatalogCache::default(), host())
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        let cache = CatalogCache::new(config.naming.clone());
        let mut importer = Importer::new(config, schedule(), &cache, host()).unwrap();
        assert!(importer.reload_catalog(&cache).is_ok());
        assert!(importer.reload_catalog(&CatalogCache::default()).is_err());
    }

    #[test]
    fn test_run_multiple_stories() {
        let mut importer = importer(host());
        let stories: Vec<_> = (1..=4)
            .map(|i| story(i, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]))
            .collect();
        let summary = importer.run(&stories, &no_cancel());
        assert!(!summary.cancelled);
        assert!(summary.finished_at.is_some());
        assert_eq!(summary.totals.succeeded, 4);
        // Story 3 is M45 walls -> M35 beams; story 4 is M30 -> M30
        assert_eq!(summary.stories[2].beam_slab_grade.as_deref(), Some("M35"));
        assert_eq!(summary.stories[3].beam_slab_grade.as_deref(), Some("M30"));
        // One point pair per story elevation
        assert_eq!(importer.host().points.len(), 8);
    }

    #[test]
    fn test_story_outside_schedule_has_no_preference() {
        let mut importer = importer(host());
        let summary = importer.import_story(&story(11, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]), &no_cancel());
        assert_eq!(summary.wall_grade, None);
        assert_eq!(summary.tally.succeeded, 1);
        // Ties on distance resolve by name
        assert_eq!(importer.host().frames[0].section, "B20X45M35");
    }

    #[test]
    fn test_schedule_mismatch_rejected_before_import() {
        let short = GradeSchedule::new(vec![GradeScheduleRow::new(1, 3, "M45")]);
        let host = host();
        let err = Importer::new(BuildingConfig::default(), short, &CatalogCache::default(), host)
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "SCHEDULE_MISMATCH");
    }

    #[test]
    fn test_missing_gravity_depth_aborts_layer() {
        let mut config = BuildingConfig::default();
        config
            .floors
            .get_mut(&FloorType::Typical)
            .unwrap()
            .gravity_depths_mm
            .remove(&GravitySubtype::Internal);
        let mut importer = Importer::new(config, schedule(), &CatalogCache::default(), host()).unwrap();
        let summary = importer.import_story(&story(1, vec![line("Gravity", (0.0, 0.0), (4000.0, 0.0))]), &no_cancel());
        let layer = summary.layer("Gravity").unwrap();
        assert_eq!(layer.aborted.as_ref().map(|e| e.error_code()), Some("MISSING_FIELD"));
    }

    #[test]
    fn test_cantilever_support_detection() {
        let balcony = CadEntity::new(
            "Balcony",
            CadGeometry::Polyline {
                points: vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1000.0, 0.0),
                    Point2::new(1000.0, 1600.0),
                    Point2::new(0.0, 1600.0),
                ],
                closed: true,
            },
        );
        let wall = line("Peripheral Wall", (-2000.0, 0.0), (3000.0, 0.0));
        let mut host = host();
        host.sections.remove(&ElementFamily::Slab);

        // Shortest edge: 1.0 m -> 125 mm
        let mut plain = importer(host.clone());
        plain.import_story(&story(1, vec![wall.clone(), balcony.clone()]), &no_cancel());
        assert_eq!(plain.host().areas[1].section, "S125S");

        // Span measured from the wall: 1.6 m -> 180 mm
        let mut config = BuildingConfig::default();
        config.detect_cantilever_support = true;
        let mut detecting = Importer::new(config, schedule(), &CatalogCache::default(), host).unwrap();
        detecting.import_story(&story(1, vec![wall, balcony]), &no_cancel());
        assert_eq!(detecting.host().areas[1].section, "S180S");
    }

    #[test]
    fn test_catalog_loaded_once_through_cache() {
        let cache = CatalogCache::default();
        let host = host();
        let importer = Importer::new(BuildingConfig::default(), schedule(), &cache, host).unwrap();
        let queries = importer.host().catalog_queries();
        assert_eq!(queries, ElementFamily::ALL.len());

        let again = Importer::new(BuildingConfig::default(), schedule(), &cache, importer.into_host()).unwrap();
        assert_eq!(again.host().catalog_queries(), queries);
    }

    #[test]
    fn test_story_pass_json() {
        let json = r#"{
            "story_index": 1,
            "story_label": "Story1",
            "elevation_m": 3.0,
            "story_height_m": 3.0,
            "entities": [
                { "layer": "Gravity", "geometry": { "type": "Line", "start": { "x": 0, "y": 0 }, "end": { "x": 4000, "y": 0 } } },
                { "layer": "Slab", "geometry": { "type": "Hatch", "paths": [[
                    { "kind": "Line", "start": { "x": 0, "y": 0 }, "end": { "x": 1000, "y": 0 } }
                ]] } }
            ]
        }"#;
        let pass: StoryPass = serde_json::from_str(json).unwrap();
        assert_eq!(pass.floor_type, FloorType::Typical);
        assert_eq!(pass.entities.len(), 2);
    }
}
