//! Template acquisition from a directory on this machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use butler_core::{
    application::{
        ApplicationError,
        ports::{Filesystem, TemplateSource, WalkControl},
    },
    domain::{EntryKind, TemplateEntry},
    error::ButlerResult,
};
use tracing::{debug, info, instrument, warn};

/// Directories never copied out of a template.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Copies a local template tree (plain path or `file://` URL) into the
/// destination. Remote URLs are rejected.
pub struct LocalTemplateSource {
    filesystem: Arc<dyn Filesystem>,
}

impl LocalTemplateSource {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Turn a configured url into a local path.
    pub fn resolve(url: &str) -> ButlerResult<PathBuf> {
        let url = url.trim();
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") || url.starts_with("git@") {
            return Err(ApplicationError::UnsupportedSource {
                location: url.to_string(),
            }
            .into());
        }
        Ok(PathBuf::from(url))
    }

    fn copy_tree(&self, source: &Path, destination: &Path) -> Result<usize, String> {
        self.filesystem
            .create_dir_all(destination)
            .map_err(|e| format!("cannot create {}: {}", destination.display(), e))?;

        let mut copied = 0;
        let mut failure = None;
        self.filesystem.walk(source, &mut |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    failure = Some(err.to_string());
                    return WalkControl::Stop;
                }
            };
            if entry.depth == 0 {
                return WalkControl::Continue;
            }

            let Ok(relative) = entry.path.strip_prefix(source) else {
                return WalkControl::Continue;
            };
            let target = destination.join(relative);

            let result = match entry.kind {
                EntryKind::Directory => {
                    let skipped = entry
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| SKIPPED_DIRS.contains(&n));
                    if skipped {
                        return WalkControl::SkipSubtree;
                    }
                    self.filesystem.create_dir_all(&target)
                }
                EntryKind::File => {
                    copied += 1;
                    self.filesystem.copy_file(&entry.path, &target)
                }
                EntryKind::Other => {
                    debug!(path = %entry.path.display(), "Not copying special file");
                    Ok(())
                }
            };

            match result {
                Ok(()) => WalkControl::Continue,
                Err(e) => {
                    failure = Some(format!("cannot copy {}: {}", entry.path.display(), e));
                    WalkControl::Stop
                }
            }
        });

        match failure {
            Some(reason) => Err(reason),
            None => Ok(copied),
        }
    }
}

impl TemplateSource for LocalTemplateSource {
    #[instrument(skip_all, fields(template = %template.name, dest = %destination.display()))]
    fn fetch(&self, template: &TemplateEntry, destination: &Path) -> ButlerResult<()> {
        let source = Self::resolve(&template.url)?;
        let failed = |reason: String| ApplicationError::AcquisitionFailed {
            template: template.name.clone(),
            reason,
        };

        if !self.filesystem.is_dir(&source) {
            return Err(failed(format!("{} is not a directory", source.display())).into());
        }
        if self.filesystem.exists(destination) {
            return Err(ApplicationError::ProjectExists {
                path: destination.to_path_buf(),
            }
            .into());
        }

        match self.copy_tree(&source, destination) {
            Ok(files) => {
                info!(files, source = %source.display(), "Template copied");
                Ok(())
            }
            Err(reason) => {
                if let Err(e) = self.filesystem.remove_dir_all(destination) {
                    warn!(error = %e, "Could not clean up partial copy");
                }
                Err(failed(reason).into())
            }
        }
    }
}
