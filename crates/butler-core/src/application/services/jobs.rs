//! Job handlers for the two phases, plus rename application.
//!
//! Each handler is a closure over the run's shared, read-only pieces. A
//! handler either returns what it did or a [`JobError`]; the queue turns
//! both (and any panic) into report entries.

use std::io;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::application::Renderer;
use crate::application::ports::Filesystem;
use crate::application::queue::JobHandler;
use crate::domain::{
    JobError, JobOutcome, Phase, RenameCollector, RenamePlan, RenderJob, RunReport,
};

/// Directory phase: render the base name and record a rename if it changed.
///
/// Nothing on disk is touched here.
pub fn directory_handler(renderer: Arc<Renderer>, collector: Arc<RenameCollector>) -> JobHandler {
    Arc::new(move |job: &RenderJob| -> Result<JobOutcome, JobError> {
        let Some(name) = job.name() else {
            return Ok(JobOutcome::Unchanged);
        };

        let rendered = renderer.render_name(name, job.path(), job.context())?;
        if rendered == name {
            return Ok(JobOutcome::Unchanged);
        }

        let to = job.path().with_file_name(&rendered);
        debug!(from = %job.path().display(), to = %to.display(), "Rename recorded");
        collector.record(job.path(), &to);
        Ok(JobOutcome::RenameRecorded { to })
    })
}

/// File phase: render name and body, write the result, drop the original if
/// the name changed.
///
/// The body is rendered completely before anything is written, so a render
/// failure leaves the original file as it was. An existing file at the
/// rendered name is truncated and replaced.
pub fn file_handler(renderer: Arc<Renderer>, filesystem: Arc<dyn Filesystem>) -> JobHandler {
    Arc::new(move |job: &RenderJob| -> Result<JobOutcome, JobError> {
        let path = job.path();
        let Some(name) = job.name() else {
            return Ok(JobOutcome::Unchanged);
        };

        let rendered_name = renderer.render_name(name, path, job.context())?;
        let target = path.with_file_name(&rendered_name);

        let raw = filesystem
            .read_file(path)
            .map_err(|e| JobError::io("read", path, e))?;
        let content = renderer.render_content(&raw, path, job.context())?;

        if target == path {
            if content == raw {
                return Ok(JobOutcome::Unchanged);
            }
            filesystem
                .write_file(path, &content)
                .map_err(|e| JobError::io("write", path, e))?;
            return Ok(JobOutcome::Rendered);
        }

        let executable = filesystem
            .is_executable(path)
            .map_err(|e| JobError::io("stat", path, e))?;
        filesystem
            .write_file(&target, &content)
            .map_err(|e| JobError::io("write", &target, e))?;
        if executable {
            filesystem
                .set_permissions(&target, true)
                .map_err(|e| JobError::io("chmod", &target, e))?;
        }
        filesystem
            .remove_file(path)
            .map_err(|e| JobError::io("remove", path, e))?;

        debug!(from = %path.display(), to = %target.display(), "File moved");
        Ok(JobOutcome::Moved { to: target })
    })
}

/// Apply recorded directory renames in plan order (deepest first).
///
/// A record whose source is gone is skipped. A record whose destination
/// already exists fails and leaves the source in place.
pub fn apply_renames(filesystem: &dyn Filesystem, plan: RenamePlan) -> RunReport {
    let mut report = RunReport::default();
    if plan.is_empty() {
        return report;
    }

    info!(renames = plan.len(), "Applying directory renames");
    for record in plan {
        if !filesystem.exists(&record.from) {
            warn!(path = %record.from.display(), "Rename source vanished, skipping");
            report.unchanged += 1;
            report.succeeded += 1;
            continue;
        }
        if filesystem.exists(&record.to) {
            let err = JobError::io(
                "rename",
                &record.from,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", record.to.display()),
                ),
            );
            error!(path = %record.from.display(), error = %err, "Rename failed");
            report.record_failure(&record.from, Phase::Directory, err);
            continue;
        }

        match filesystem.rename(&record.from, &record.to) {
            Ok(()) => {
                debug!(from = %record.from.display(), to = %record.to.display(), "Renamed");
                report.record_rename();
            }
            Err(e) => {
                let err = JobError::io("rename", &record.from, e);
                error!(path = %record.from.display(), error = %err, "Rename failed");
                report.record_failure(&record.from, Phase::Directory, err);
            }
        }
    }
    report
}
