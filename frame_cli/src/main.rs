//! # PlanFrame CLI
//!
//! Runs the floor-plan import offline: a job file supplies the building
//! configuration and grade schedule, a model snapshot supplies the CAD
//! stories and the template's section names, and the generated model is
//! recorded in memory.
//!
//! ```text
//! planframe init tower.pfj --engineer "J. Rao" --job-id 26-014 --floors 12
//! planframe sections --model tower-model.json --job tower.pfj
//! planframe schedule --job tower.pfj
//! planframe import --job tower.pfj --model tower-model.json --format json
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use frame_core::catalog::{CatalogCache, ElementFamily, SectionCatalog, SectionNaming};
use frame_core::file_io::{load_job_with_lock_check, load_model, save_job, FileLock};
use frame_core::grades::GradeScheduleRow;
use frame_core::import::{ImportSummary, Importer, RecordingHost};
use frame_core::job::JobFile;
use frame_core::{FrameError, FrameResult};

#[derive(Parser, Debug)]
#[command(name = "planframe")]
#[command(about = "PlanFrame - convert CAD floor plans into sized structural elements")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a model snapshot against an in-memory host
    Import {
        /// Job file (.pfj)
        #[arg(long, value_name = "FILE")]
        job: PathBuf,

        /// Model snapshot (JSON)
        #[arg(long, value_name = "FILE")]
        model: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also write the generated points, frames and areas (JSON)
        #[arg(long, value_name = "FILE")]
        emit_model: Option<PathBuf>,
    },

    /// List the parsed section catalog of a model snapshot
    Sections {
        #[arg(long, value_name = "FILE")]
        model: PathBuf,

        /// Job file whose section naming to use (default prefixes otherwise)
        #[arg(long, value_name = "FILE")]
        job: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show wall and beam/slab grades for every story
    Schedule {
        #[arg(long, value_name = "FILE")]
        job: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Create a new job file with a single-grade schedule
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
struct InitArgs {
    /// Path of the job file to create
    path: PathBuf,

    #[arg(long, default_value = "")]
    engineer: String,

    #[arg(long, default_value = "")]
    job_id: String,

    #[arg(long, default_value = "")]
    client: String,

    /// Total number of floors
    #[arg(long, default_value_t = 10)]
    floors: u32,

    #[arg(long, default_value = "Zone III")]
    zone: String,

    /// Wall grade for every floor
    #[arg(long, default_value = "M40")]
    wall_grade: String,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn print_json<T: Serialize>(value: &T) -> FrameResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| FrameError::SerializationError {
        reason: e.to_string(),
    })?;
    println!("{json}");
    Ok(())
}

fn load_job_read_only(job_path: &Path) -> FrameResult<JobFile> {
    let (job, lock) = load_job_with_lock_check(job_path)?;
    if let Some(lock) = lock {
        tracing::warn!(
            user = %lock.user_id,
            machine = %lock.machine,
            since = %lock.locked_at,
            "job file is open elsewhere, reading without changes"
        );
    }
    Ok(job)
}

fn run_import(job_path: &Path, model_path: &Path, format: OutputFormat, emit_model: Option<&Path>) -> FrameResult<()> {
    let job = load_job_read_only(job_path)?;
    let model = load_model(model_path)?;
    tracing::info!(job = %job.meta.job_id, stories = model.stories.len(), "loaded job and model");

    let cache = CatalogCache::new(job.config.naming.clone());
    let host = RecordingHost::new(model.sections);
    let mut importer = Importer::new(job.config, job.grade_schedule, &cache, host)?;

    let cancel = AtomicBool::new(false);
    let summary = importer.run(&model.stories, &cancel);

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => print_summary(&summary),
    }

    if let Some(path) = emit_model {
        let host = importer.into_host();
        let json = serde_json::to_string_pretty(&host).map_err(|e| FrameError::SerializationError {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json)
            .map_err(|e| FrameError::file_error("write", path.display().to_string(), e.to_string()))?;
        if format == OutputFormat::Text {
            println!("Generated model written to {}", path.display());
        }
    }

    summary.check_cancelled()
}

fn print_summary(summary: &ImportSummary) {
    println!("Import {}", summary.run_id);
    println!("═══════════════════════════════════════");
    for story in &summary.stories {
        println!(
            "{} (story {}): walls {}, beams/slabs {}",
            story.story_label,
            story.story_index,
            story.wall_grade.as_deref().unwrap_or("-"),
            story.beam_slab_grade.as_deref().unwrap_or("-"),
        );
        for layer in &story.layers {
            let status = match &layer.aborted {
                Some(err) => format!("  [ABORTED: {err}]"),
                None => String::new(),
            };
            println!(
                "  {:<28} ok {:>4}  failed {:>4}  skipped {:>4}{}",
                layer.layer, layer.tally.succeeded, layer.tally.failed, layer.tally.skipped, status
            );
            for (section, count) in &layer.sections_used {
                println!("      {section:<20} x{count}");
            }
        }
    }
    println!("═══════════════════════════════════════");
    println!(
        "TOTAL: {} succeeded, {} failed, {} skipped{}",
        summary.totals.succeeded,
        summary.totals.failed,
        summary.totals.skipped,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
}

fn run_sections(model_path: &Path, job_path: Option<&Path>, format: OutputFormat) -> FrameResult<()> {
    let naming = match job_path {
        Some(path) => load_job_read_only(path)?.config.naming,
        None => SectionNaming::default(),
    };
    let model = load_model(model_path)?;
    let catalog = SectionCatalog::from_family_lists(model.sections, &naming);

    if format == OutputFormat::Json {
        return print_json(&catalog);
    }

    for family in ElementFamily::ALL {
        let entries = catalog.entries(family);
        println!("{} ({} sections)", family.display_name(), entries.len());
        for entry in entries {
            println!("  {:<20} {}", entry.section_name, entry.describe());
        }
    }
    if catalog.uses_fallback_slabs() {
        println!("note: no slab sections in model, standard thicknesses synthesized");
    }
    if catalog.skipped_names() > 0 {
        println!("note: {} section names did not parse", catalog.skipped_names());
    }
    Ok(())
}

#[derive(Serialize)]
struct StoryGrades {
    story: u32,
    wall_grade: Option<String>,
    beam_slab_grade: Option<String>,
}

fn run_schedule(job_path: &Path, format: OutputFormat) -> FrameResult<()> {
    let job = load_job_read_only(job_path)?;
    job.validate()?;

    let rows: Vec<StoryGrades> = (1..=job.config.total_floor_count)
        .map(|story| StoryGrades {
            story,
            wall_grade: job.grade_schedule.wall_grade_for_story(story).map(str::to_string),
            beam_slab_grade: job.grade_schedule.beam_slab_grade_for_story(story),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Text => {
            println!("{:>5}  {:>6}  {:>10}", "Story", "Wall", "Beam/Slab");
            for row in rows.iter().rev() {
                println!(
                    "{:>5}  {:>6}  {:>10}",
                    row.story,
                    row.wall_grade.as_deref().unwrap_or("-"),
                    row.beam_slab_grade.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
    }
}

fn run_init(args: InitArgs) -> FrameResult<()> {
    let path = args.path.as_path();
    if path.exists() && !args.force {
        return Err(FrameError::file_error(
            "create",
            path.display().to_string(),
            "file exists (use --force to overwrite)",
        ));
    }

    let mut job = JobFile::new(args.engineer.clone(), args.job_id, args.client);
    job.config.seismic_zone = args.zone;
    job.config.total_floor_count = args.floors;
    job.config.typical_floor_count = args.floors;
    job.grade_schedule.rows.push(GradeScheduleRow::new(1, args.floors, args.wall_grade));
    job.validate()?;

    let _lock = FileLock::acquire(path, args.engineer)?;
    save_job(&job, path)?;
    println!("Created {} (job {})", path.display(), job.meta.id);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,frame_core=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Import {
            job,
            model,
            format,
            emit_model,
        } => run_import(&job, &model, format, emit_model.as_deref()),
        Command::Sections { model, job, format } => run_sections(&model, job.as_deref(), format),
        Command::Schedule { job, format } => run_schedule(&job, format),
        Command::Init(init) => run_init(init),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{json}");
            }
            ExitCode::FAILURE
        }
    }
}
