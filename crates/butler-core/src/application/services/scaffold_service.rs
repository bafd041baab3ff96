//! Scaffold Service - main application orchestrator.
//!
//! This service coordinates the whole run:
//! 1. Acquire the template into the destination (optional)
//! 2. Directory phase: walk, render names, drain, apply renames
//! 3. File phase: walk, render names and bodies, drain
//! 4. Report
//!
//! The two phases never overlap. Every job failure lands in the returned
//! [`RunReport`]; only setup faults come back as errors.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError, JobQueue, Renderer, TreeWalker,
        ports::{ExpressionEngine, Filesystem, TemplateSource},
        queue::default_workers,
        services::jobs,
    },
    domain::{
        Context, Delimiters, FunctionTable, PathFilter, Phase, RenameCollector, RunReport,
        TemplateEntry,
    },
    error::ButlerResult,
};

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    /// Worker threads per phase; 0 means one per available CPU.
    pub workers: usize,
    /// Jobs that may wait in the channel; 0 hands each job straight to a
    /// worker.
    pub queue_capacity: usize,
    pub filter: PathFilter,
    pub delimiters: Delimiters,
    pub functions: FunctionTable,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: 0,
            filter: PathFilter::default(),
            delimiters: Delimiters::default(),
            functions: FunctionTable::standard(),
        }
    }
}

impl ScaffoldOptions {
    fn worker_count(&self) -> usize {
        match self.workers {
            0 => default_workers(),
            n => n,
        }
    }
}

/// Main scaffolding service.
pub struct ScaffoldService {
    filesystem: Arc<dyn Filesystem>,
    engine: Arc<dyn ExpressionEngine>,
    source: Option<Box<dyn TemplateSource>>,
    options: ScaffoldOptions,
}

impl ScaffoldService {
    /// Create a new scaffold service with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let fs: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    /// let service = ScaffoldService::new(
    ///     Arc::clone(&fs),
    ///     Arc::new(MarkerEngine::new()),
    ///     ScaffoldOptions::default(),
    /// )
    /// .with_source(Box::new(LocalTemplateSource::new(fs)));
    /// ```
    pub fn new(
        filesystem: Arc<dyn Filesystem>,
        engine: Arc<dyn ExpressionEngine>,
        options: ScaffoldOptions,
    ) -> Self {
        Self {
            filesystem,
            engine,
            source: None,
            options,
        }
    }

    /// Attach the adapter used by [`scaffold`](Self::scaffold).
    pub fn with_source(mut self, source: Box<dyn TemplateSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn options(&self) -> &ScaffoldOptions {
        &self.options
    }

    /// Scaffold a new project.
    ///
    /// Fetches `template` into the context's project path and renders it in
    /// place. An existing destination is refused unless `overwrite` is set,
    /// in which case it is removed first.
    #[instrument(
        skip_all,
        fields(
            template = %template.name,
            project = %context.project().name,
            dest = %context.project().path.display()
        )
    )]
    pub fn scaffold(
        &self,
        template: &TemplateEntry,
        context: Context,
        overwrite: bool,
    ) -> ButlerResult<RunReport> {
        let dest = context.project().path.clone();
        let source = self
            .source
            .as_ref()
            .ok_or(ApplicationError::AdapterNotConfigured {
                name: "template source",
            })?;

        if self.filesystem.exists(&dest) {
            if !overwrite {
                return Err(ApplicationError::ProjectExists { path: dest }.into());
            }
            warn!(path = %dest.display(), "Removing existing destination");
            self.filesystem.remove_dir_all(&dest).map_err(|e| {
                ApplicationError::FilesystemError {
                    path: dest.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        info!("Fetching template");
        source.fetch(template, &dest)?;

        self.render_tree(context)
    }

    /// Render an already materialized tree in place.
    ///
    /// The tree root is the context's project path.
    #[instrument(skip_all, fields(root = %context.project().path.display()))]
    pub fn render_tree(&self, context: Context) -> ButlerResult<RunReport> {
        let root = context.project().path.clone();
        if !self.filesystem.exists(&root) {
            return Err(ApplicationError::DestinationMissing { path: root }.into());
        }
        if !self.filesystem.is_dir(&root) {
            return Err(ApplicationError::DestinationNotDirectory { path: root }.into());
        }

        let started = Instant::now();
        let workers = self.options.worker_count();
        let capacity = self.options.queue_capacity;
        let context = Arc::new(context);
        let renderer = Arc::new(Renderer::new(
            Arc::clone(&self.engine),
            self.options.delimiters.clone(),
            self.options.functions.clone(),
        ));
        let walker = TreeWalker::new(
            Arc::clone(&self.filesystem),
            Arc::new(self.options.filter.clone()),
        );

        info!(workers, "Rendering directory names");
        let collector = Arc::new(RenameCollector::new());
        let queue = JobQueue::start(
            Phase::Directory,
            workers,
            capacity,
            jobs::directory_handler(Arc::clone(&renderer), Arc::clone(&collector)),
        )?;
        let walked = walker.walk(&root, Phase::Directory, &queue, &context)?;
        let mut report = queue.drain();
        report.merge(walked.failures);
        report.merge(jobs::apply_renames(
            self.filesystem.as_ref(),
            collector.take_plan(),
        ));

        info!("Rendering files");
        let queue = JobQueue::start(
            Phase::File,
            workers,
            capacity,
            jobs::file_handler(renderer, Arc::clone(&self.filesystem)),
        )?;
        let walked = walker.walk(&root, Phase::File, &queue, &context)?;
        report.merge(queue.drain());
        report.merge(walked.failures);

        report.elapsed = started.elapsed();
        info!(
            succeeded = report.succeeded,
            failed = report.failed(),
            renamed = report.directories_renamed,
            rendered = report.files_rendered,
            moved = report.files_moved,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Render finished"
        );
        Ok(report)
    }
}
