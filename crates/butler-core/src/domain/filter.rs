//! Skip rules for the tree walk.
//!
//! [`PathFilter`] is a pure predicate over an entry's base name and kind. It
//! only reads the exclusion sets built at construction, so a single instance
//! is shared by the walker of both phases without any locking.

use std::collections::HashSet;
use std::path::Path;

use crate::domain::DomainError;

/// Names starting with this marker are hidden and never processed.
pub const HIDDEN_MARKER: char = '.';

/// Directory names skipped by default (dependency and build output trees).
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "jspm_packages",
    "vendor",
    "target",
    "dist",
    "build",
    "__pycache__",
];

/// File extensions treated as binary by default (never text-rendered).
pub const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "icns", "tif", "tiff", "webp", "psd", "pdf", "zip",
    "gz", "tgz", "tar", "bz2", "xz", "7z", "rar", "jar", "war", "exe", "dll", "so", "dylib", "a",
    "o", "class", "pyc", "bin", "wasm", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4",
    "wav", "ogg", "avi", "mov", "sqlite", "db",
];

/// Kind of a filesystem entry as seen by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    /// Symlinks, sockets, devices. Never rendered or renamed.
    Other,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Outcome of [`PathFilter::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Proceed,
    SkipEntry,
    /// Do not descend. Only produced for directories.
    SkipSubtree,
}

/// Immutable skip rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    excluded_dirs: HashSet<String>,
    /// Lowercase, without the leading dot.
    binary_extensions: HashSet<String>,
}

impl PathFilter {
    /// Build a filter from explicit exclusion sets.
    ///
    /// Extensions may be given with or without a leading dot and are matched
    /// case-insensitively.
    pub fn new<D, E>(excluded_dirs: D, binary_extensions: E) -> Result<Self, DomainError>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut dirs = HashSet::new();
        for dir in excluded_dirs {
            let dir = dir.as_ref().trim();
            if dir.is_empty() || dir.contains('/') || dir.contains('\\') {
                return Err(DomainError::InvalidExclusion {
                    entry: dir.to_string(),
                    reason: "directory exclusions are plain base names",
                });
            }
            dirs.insert(dir.to_string());
        }

        let mut exts = HashSet::new();
        for ext in binary_extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.');
            if ext.is_empty() {
                return Err(DomainError::InvalidExclusion {
                    entry: ext.to_string(),
                    reason: "extension cannot be empty",
                });
            }
            exts.insert(ext.to_ascii_lowercase());
        }

        Ok(Self {
            excluded_dirs: dirs,
            binary_extensions: exts,
        })
    }

    /// Decide what to do with an entry given its base name and kind.
    pub fn decide(&self, name: &str, kind: EntryKind) -> FilterDecision {
        if name.starts_with(HIDDEN_MARKER) {
            return if kind.is_dir() {
                FilterDecision::SkipSubtree
            } else {
                FilterDecision::SkipEntry
            };
        }

        match kind {
            EntryKind::Directory if self.excluded_dirs.contains(name) => {
                FilterDecision::SkipSubtree
            }
            EntryKind::Directory => FilterDecision::Proceed,
            EntryKind::File if self.is_binary(name) => FilterDecision::SkipEntry,
            EntryKind::File => FilterDecision::Proceed,
            EntryKind::Other => FilterDecision::SkipEntry,
        }
    }

    /// Convenience wrapper taking a full path.
    ///
    /// Paths without a UTF-8 base name are skipped: they can be neither
    /// rendered nor safely renamed.
    pub fn decide_path(&self, path: &Path, kind: EntryKind) -> FilterDecision {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.decide(name, kind),
            None if kind.is_dir() => FilterDecision::SkipSubtree,
            None => FilterDecision::SkipEntry,
        }
    }

    /// A name without a dot is its own extension, so a file called `png`
    /// counts as binary.
    fn is_binary(&self, name: &str) -> bool {
        let ext = name.rsplit_once('.').map_or(name, |(_, ext)| ext);
        self.binary_extensions.contains(&ext.to_ascii_lowercase())
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
