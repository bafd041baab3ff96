//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `butler-adapters` crate provides implementations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{Context, Delimiters, EntryKind, FunctionTable, RenderPhase, TemplateEntry};
use crate::error::ButlerResult;

/// One entry produced by [`Filesystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// 0 for the walk root.
    pub depth: usize,
}

/// What the visitor wants the walk to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Do not descend into the directory just visited.
    SkipSubtree,
    Stop,
}

/// An entry the walk could not read. The walk carries on afterwards.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot read {}: {reason}", path.as_deref().unwrap_or(Path::new("<unknown>")).display())]
pub struct WalkError {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Port for filesystem operations.
///
/// Implemented by:
/// - `butler_adapters::filesystem::LocalFilesystem` (production)
/// - `butler_adapters::filesystem::MemoryFilesystem` (testing)
///
/// Paths are used as given; the caller owns the destination tree for the
/// whole run.
pub trait Filesystem: Send + Sync {
    /// Visit `root` and everything below it, top-down, parents before
    /// children. Symlinks are reported as [`EntryKind::Other`] and never
    /// followed.
    fn walk(&self, root: &Path, visitor: &mut dyn FnMut(Result<FsEntry, WalkError>) -> WalkControl);

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `content` to it.
    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Move `from` to `to`. Fails with `AlreadyExists` if `to` exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn is_executable(&self, path: &Path) -> io::Result<bool>;

    /// Set or clear the executable bit.
    fn set_permissions(&self, path: &Path, executable: bool) -> io::Result<()>;

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Failure reported by an [`ExpressionEngine`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{phase}: {message}")]
pub struct ExpressionError {
    pub phase: RenderPhase,
    pub message: String,
}

impl ExpressionError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            phase: RenderPhase::Parse,
            message: message.into(),
        }
    }

    pub fn execute(message: impl Into<String>) -> Self {
        Self {
            phase: RenderPhase::Execute,
            message: message.into(),
        }
    }
}

/// Port for marker evaluation.
///
/// Implemented by:
/// - `butler_adapters::renderer::MarkerEngine`
///
/// Must be callable from many workers at once.
#[cfg_attr(test, mockall::automock)]
pub trait ExpressionEngine: Send + Sync {
    /// Replace every marker in `source` with its value under `context`.
    fn render(
        &self,
        source: &str,
        delimiters: &Delimiters,
        functions: &FunctionTable,
        context: &Context,
    ) -> Result<String, ExpressionError>;
}

/// Port for template acquisition.
///
/// Implemented by:
/// - `butler_adapters::template_source::LocalTemplateSource`
pub trait TemplateSource: Send + Sync {
    /// Materialize `template` into `destination`, which must not exist yet.
    fn fetch(&self, template: &TemplateEntry, destination: &Path) -> ButlerResult<()>;
}
