//! # File I/O
//!
//! Job file operations:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **File locking**: advisory `.pfj.lock` files backed by an OS lock
//! - **Version validation**: refuse files from an incompatible schema
//!
//! Model snapshots (`.json`) are read-only inputs and are loaded without
//! locking.
//!
//! ## Example
//!
//! ```rust,no_run
//! use frame_core::file_io::{save_job, load_job, FileLock};
//! use frame_core::job::JobFile;
//! use std::path::Path;
//!
//! let job = JobFile::new("Engineer", "26-001", "Client");
//! let path = Path::new("tower-a.pfj");
//!
//! let lock = FileLock::acquire(path, "engineer@firm.example").unwrap();
//! save_job(&job, path).unwrap();
//! drop(lock);
//!
//! let loaded = load_job(path).unwrap();
//! assert_eq!(loaded.meta.id, job.meta.id);
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{FrameError, FrameResult};
use crate::job::{JobFile, ModelSnapshot, SCHEMA_VERSION};

/// Job file extension
pub const JOB_EXTENSION: &str = "pfj";

/// Locks older than this are considered abandoned
const STALE_LOCK_HOURS: i64 = 24;

/// Lock file metadata stored in `.pfj.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Whether the holder is gone or the lock has expired
    pub fn is_stale(&self) -> bool {
        if hostname().as_deref() == Some(self.machine.as_str()) && !process_alive(self.pid) {
            return true;
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn io_error(operation: &str, path: &Path, err: impl ToString) -> FrameError {
    FrameError::file_error(operation, path.display().to_string(), err.to_string())
}

fn serialization_error(err: impl ToString) -> FrameError {
    FrameError::SerializationError {
        reason: err.to_string(),
    }
}

/// Exclusive lock on a job file, released on drop.
///
/// Combines an OS-level lock (fs2) with a `.lock` file that tells other
/// users who holds the job.
#[derive(Debug)]
pub struct FileLock {
    job_path: PathBuf,
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on `path`.
    ///
    /// Returns `FileLocked` when another live process holds it. Stale lock
    /// files are taken over.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> FrameResult<Self> {
        if let Some(existing) = FileLock::check(path) {
            return Err(FrameError::file_locked(
                path.display().to_string(),
                format!("{} ({})", existing.user_id, existing.machine),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| io_error("create lock", &lock_path, e))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            FrameError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let lock_json = serde_json::to_string_pretty(&info).map_err(serialization_error)?;
        lock_file
            .write_all(lock_json.as_bytes())
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| io_error("write lock", &lock_path, e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "job file locked");
        Ok(FileLock {
            job_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current holder of the lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path))
            .ok()
            .filter(|info| !info.is_stale())
    }

    pub fn job_path(&self) -> &Path {
        &self.job_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `tower.pfj` -> `tower.pfj.lock`
fn lock_path_for(job_path: &Path) -> PathBuf {
    let mut lock_path = job_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> FrameResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(|e| io_error("read lock", lock_path, e))?;
    serde_json::from_str(&contents).map_err(serialization_error)
}

/// Save a job with atomic write semantics.
///
/// The JSON is written to `<path>.tmp`, synced and renamed over `path`,
/// so an interrupted save never leaves a truncated job behind.
pub fn save_job(job: &JobFile, path: &Path) -> FrameResult<()> {
    let json = serde_json::to_string_pretty(job).map_err(serialization_error)?;
    let tmp_path = path.with_extension(format!("{JOB_EXTENSION}.tmp"));

    let mut tmp_file = File::create(&tmp_path).map_err(|e| io_error("create temp file", &tmp_path, e))?;
    tmp_file
        .write_all(json.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| io_error("write temp file", &tmp_path, e))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_error("rename to final", path, e)
    })?;

    tracing::debug!(path = %path.display(), job = %job.meta.job_id, "job saved");
    Ok(())
}

/// Load a job, checking its schema version.
pub fn load_job(path: &Path) -> FrameResult<JobFile> {
    let contents = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    let job: JobFile = serde_json::from_str(&contents).map_err(|e| FrameError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;
    validate_version(&job.meta.version)?;
    Ok(job)
}

/// Load a job along with the current lock holder, if any.
///
/// A locked job can still be read; callers should treat it as read-only.
pub fn load_job_with_lock_check(path: &Path) -> FrameResult<(JobFile, Option<LockInfo>)> {
    let job = load_job(path)?;
    Ok((job, FileLock::check(path)))
}

/// Load a pre-read CAD model snapshot.
pub fn load_model(path: &Path) -> FrameResult<ModelSnapshot> {
    let contents = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    serde_json::from_str(&contents).map_err(|e| FrameError::SerializationError {
        reason: format!("Invalid model in {}: {}", path.display(), e),
    })
}

/// Accept files with the same major version, and for 0.x no newer minor.
fn validate_version(file_version: &str) -> FrameResult<()> {
    let parse = |v: &str| -> Vec<u32> { v.split('.').filter_map(|p| p.parse().ok()).collect() };
    let file = parse(file_version);
    let current = parse(SCHEMA_VERSION);

    let compatible = match (file.as_slice(), current.as_slice()) {
        ([file_major, rest @ ..], [major, current_rest @ ..]) if file_major == major => {
            *major != 0
                || match (rest.first(), current_rest.first()) {
                    (Some(file_minor), Some(minor)) => file_minor <= minor,
                    _ => true,
                }
        }
        _ => false,
    };

    if compatible {
        Ok(())
    } else {
        Err(FrameError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        })
    }
}
