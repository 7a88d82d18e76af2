//! # Error Types
//!
//! Structured error types for frame_core. Each variant maps onto one of the
//! outcome categories of an import run, so callers can decide whether a
//! failure is local to one CAD entity or aborts a whole layer or run.
//!
//! | Variant | Scope | Tallied as |
//! |---------|-------|------------|
//! | `CatalogEmpty` | element family | layer aborted |
//! | `NoSectionMatch` | one entity | failed |
//! | `GeometryInvalid` | one entity | skipped |
//! | `HostCallFailed` | one entity | failed |
//! | `ScheduleMismatch` | whole run | import never starts |
//!
//! ## Example
//!
//! ```rust
//! use frame_core::errors::{FrameError, FrameResult};
//!
//! fn validate_floor_count(floors: u32) -> FrameResult<()> {
//!     if floors == 0 {
//!         return Err(FrameError::invalid_input(
//!             "total_floor_count",
//!             floors.to_string(),
//!             "Building must have at least one floor",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for frame_core operations
pub type FrameResult<T> = Result<T, FrameError>;

/// Structured error type for catalog, geometry and import operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum FrameError {
    /// No usable catalog entries for an element family
    #[error("Section catalog has no {family} entries")]
    CatalogEmpty { family: String },

    /// Selector could not produce a section for the requested dimensions
    #[error("No {family} section matches {required}")]
    NoSectionMatch { family: String, required: String },

    /// CAD geometry unusable (too few vertices, open, degenerate)
    #[error("Invalid geometry: {reason}")]
    GeometryInvalid { reason: String },

    /// The structural host returned a non-zero code
    #[error("Host call '{operation}' failed with code {code}")]
    HostCallFailed { operation: String, code: i32 },

    /// Grade schedule does not partition the building's floors
    #[error("Grade schedule mismatch: {reason}")]
    ScheduleMismatch { reason: String },

    /// An input value is invalid (out of range, wrong type, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Import was cancelled between entities
    #[error("Import cancelled after {processed} entities")]
    Cancelled { processed: usize },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FrameError {
    /// Create a CatalogEmpty error
    pub fn catalog_empty(family: impl Into<String>) -> Self {
        FrameError::CatalogEmpty {
            family: family.into(),
        }
    }

    /// Create a NoSectionMatch error
    pub fn no_section_match(family: impl Into<String>, required: impl Into<String>) -> Self {
        FrameError::NoSectionMatch {
            family: family.into(),
            required: required.into(),
        }
    }

    /// Create a GeometryInvalid error
    pub fn geometry_invalid(reason: impl Into<String>) -> Self {
        FrameError::GeometryInvalid {
            reason: reason.into(),
        }
    }

    /// Create a HostCallFailed error
    pub fn host_call_failed(operation: impl Into<String>, code: i32) -> Self {
        FrameError::HostCallFailed {
            operation: operation.into(),
            code,
        }
    }

    /// Create a ScheduleMismatch error
    pub fn schedule_mismatch(reason: impl Into<String>) -> Self {
        FrameError::ScheduleMismatch {
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        FrameError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        FrameError::MissingField {
            field: field.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        FrameError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        FrameError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Whether the error only affects the entity being processed.
    ///
    /// Entity-local errors are tallied and the batch continues; anything
    /// else stops the layer or the run.
    pub fn is_entity_local(&self) -> bool {
        matches!(
            self,
            FrameError::NoSectionMatch { .. }
                | FrameError::GeometryInvalid { .. }
                | FrameError::HostCallFailed { .. }
        )
    }

    /// Whether the entity should be counted as skipped rather than failed
    pub fn is_skip(&self) -> bool {
        matches!(self, FrameError::GeometryInvalid { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            FrameError::CatalogEmpty { .. } => "CATALOG_EMPTY",
            FrameError::NoSectionMatch { .. } => "NO_SECTION_MATCH",
            FrameError::GeometryInvalid { .. } => "GEOMETRY_INVALID",
            FrameError::HostCallFailed { .. } => "HOST_CALL_FAILED",
            FrameError::ScheduleMismatch { .. } => "SCHEDULE_MISMATCH",
            FrameError::InvalidInput { .. } => "INVALID_INPUT",
            FrameError::MissingField { .. } => "MISSING_FIELD",
            FrameError::FileError { .. } => "FILE_ERROR",
            FrameError::FileLocked { .. } => "FILE_LOCKED",
            FrameError::SerializationError { .. } => "SERIALIZATION_ERROR",
            FrameError::VersionMismatch { .. } => "VERSION_MISMATCH",
            FrameError::Cancelled { .. } => "CANCELLED",
            FrameError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
