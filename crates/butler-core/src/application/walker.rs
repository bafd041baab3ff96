//! Top-down traversal that turns eligible entries into jobs.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::application::ApplicationError;
use crate::application::ports::{Filesystem, WalkControl};
use crate::application::queue::JobQueue;
use crate::domain::{
    Context, EntryKind, FilterDecision, JobError, PathFilter, Phase, RenderJob, RunReport,
};

/// What one walk did, apart from the jobs themselves.
#[derive(Debug, Default)]
pub struct WalkSummary {
    pub submitted: usize,
    pub skipped: usize,
    /// Entries the walk could not read, as failures of the walking phase.
    pub failures: RunReport,
}

/// Walks the destination tree for one phase.
///
/// Directory phase submits directories only, file phase submits files only.
/// The root itself is never filtered and never submitted. Skipped directories
/// are not descended into in either phase.
pub struct TreeWalker {
    filesystem: Arc<dyn Filesystem>,
    filter: Arc<PathFilter>,
}

impl TreeWalker {
    pub fn new(filesystem: Arc<dyn Filesystem>, filter: Arc<PathFilter>) -> Self {
        Self { filesystem, filter }
    }

    /// Submit one job per eligible entry under `root` into `queue`.
    ///
    /// Only a broken worker pool stops the walk early.
    #[instrument(skip_all, fields(phase = %phase, root = %root.display()))]
    pub fn walk(
        &self,
        root: &Path,
        phase: Phase,
        queue: &JobQueue,
        context: &Arc<Context>,
    ) -> Result<WalkSummary, ApplicationError> {
        let mut summary = WalkSummary::default();
        let mut fatal = None;

        self.filesystem.walk(root, &mut |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry");
                    let path = err.path.clone().unwrap_or_else(|| root.to_path_buf());
                    summary
                        .failures
                        .record_failure(&path, phase, JobError::io("read", &path, &err.reason));
                    return WalkControl::Continue;
                }
            };

            if entry.depth == 0 {
                return WalkControl::Continue;
            }

            match self.filter.decide_path(&entry.path, entry.kind) {
                FilterDecision::SkipSubtree if entry.kind.is_dir() => {
                    trace!(path = %entry.path.display(), "Pruned");
                    summary.skipped += 1;
                    return WalkControl::SkipSubtree;
                }
                FilterDecision::SkipSubtree | FilterDecision::SkipEntry => {
                    trace!(path = %entry.path.display(), "Skipped");
                    summary.skipped += 1;
                    return WalkControl::Continue;
                }
                FilterDecision::Proceed => {}
            }

            let wanted = match phase {
                Phase::Directory => entry.kind == EntryKind::Directory,
                Phase::File => entry.kind == EntryKind::File,
            };
            if !wanted {
                return WalkControl::Continue;
            }

            let job = RenderJob::new(entry.path, entry.kind, Arc::clone(context));
            match queue.submit(job) {
                Ok(()) => {
                    summary.submitted += 1;
                    WalkControl::Continue
                }
                Err(err) => {
                    fatal = Some(err);
                    WalkControl::Stop
                }
            }
        });

        if let Some(err) = fatal {
            return Err(err);
        }

        debug!(
            submitted = summary.submitted,
            skipped = summary.skipped,
            unreadable = summary.failures.failed(),
            "Walk finished"
        );
        Ok(summary)
    }
}
