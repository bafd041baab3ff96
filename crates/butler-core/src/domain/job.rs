//! Units of work and their outcomes.
//!
//! A [`RenderJob`] is created by the walker, handed to exactly one worker,
//! and dropped when that worker is done with it. Whatever happens inside the
//! job ends up as either a [`JobOutcome`] or a [`JobFailure`] in the
//! [`RunReport`]; nothing escapes the job boundary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::domain::{Context, EntryKind};

/// The two strictly sequential passes of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Directory,
    File,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// One filesystem entry to process.
#[derive(Debug, Clone)]
pub struct RenderJob {
    path: PathBuf,
    kind: EntryKind,
    context: Arc<Context>,
}

impl RenderJob {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind, context: Arc<Context>) -> Self {
        Self {
            path: path.into(),
            kind,
            context,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Base name of the entry, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// Which step of rendering failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    Parse,
    Execute,
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// A marker could not be parsed or evaluated.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("{phase} error in {}: {cause}", path.display())]
pub struct RenderError {
    pub phase: RenderPhase,
    pub path: PathBuf,
    pub cause: String,
}

/// Why a single job failed.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to {operation} {}: {reason}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// An unexpected fault inside the job (a bug), recovered at the boundary.
    #[error("internal fault: {message}")]
    Internal { message: String },
}

impl JobError {
    pub fn io(operation: &'static str, path: &Path, err: impl fmt::Display) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    }
}

/// What a successful job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Nothing to change.
    Unchanged,
    /// A directory rename was recorded for application after the barrier.
    RenameRecorded { to: PathBuf },
    /// File content was rewritten in place.
    Rendered,
    /// File content was written to a new path and the original removed.
    Moved { to: PathBuf },
}

/// A failed job, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFailure {
    pub path: PathBuf,
    pub phase: Phase,
    pub error: JobError,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.path.display(), self.phase, self.error)
    }
}

/// Aggregate of every job outcome in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub succeeded: usize,
    pub unchanged: usize,
    pub directories_renamed: usize,
    pub files_rendered: usize,
    pub files_moved: usize,
    pub failures: Vec<JobFailure>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

impl RunReport {
    /// Account for a finished job.
    ///
    /// A recorded rename is not counted yet; [`RunReport::record_rename`]
    /// accounts for it once the rename has been applied.
    pub fn record(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Unchanged => self.unchanged += 1,
            JobOutcome::RenameRecorded { .. } => return,
            JobOutcome::Rendered => self.files_rendered += 1,
            JobOutcome::Moved { .. } => self.files_moved += 1,
        }
        self.succeeded += 1;
    }

    /// Account for a directory rename that landed on disk.
    pub fn record_rename(&mut self) {
        self.succeeded += 1;
        self.directories_renamed += 1;
    }

    /// Account for a failed job.
    pub fn record_failure(&mut self, path: impl Into<PathBuf>, phase: Phase, error: JobError) {
        self.failures.push(JobFailure {
            path: path.into(),
            phase,
            error,
        });
    }

    /// Fold another report (typically a later phase) into this one.
    pub fn merge(&mut self, other: RunReport) {
        self.succeeded += other.succeeded;
        self.unchanged += other.unchanged;
        self.directories_renamed += other.directories_renamed;
        self.files_rendered += other.files_rendered;
        self.files_moved += other.files_moved;
        self.failures.extend(other.failures);
        self.elapsed += other.elapsed;
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure for a given path, if any.
    pub fn failure_for(&self, path: &Path) -> Option<&JobFailure> {
        self.failures.iter().find(|f| f.path == path)
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}
