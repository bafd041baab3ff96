//! In-memory filesystem adapter for testing.
//!
//! Paths are kept exactly as given (no normalization). Faults can be
//! injected per operation and path to exercise failure isolation.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    io,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use butler_core::{
    application::ports::{Filesystem, FsEntry, WalkControl, WalkError},
    domain::EntryKind,
};

/// Operation a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    Walk,
    Read,
    Write,
    Rename,
    Remove,
}

/// In-memory filesystem for testing.
///
/// Cloning shares the underlying tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    directories: BTreeSet<PathBuf>,
    symlinks: BTreeSet<PathBuf>,
    executables: HashSet<PathBuf>,
    faults: HashSet<(FsOp, PathBuf)>,
}

impl MemoryFilesystemInner {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.symlinks.contains(path)
    }

    fn check(&self, op: FsOp, path: &Path) -> io::Result<()> {
        if self.faults.contains(&(op, path.to_path_buf())) {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("injected {:?} fault", op),
            ))
        } else {
            Ok(())
        }
    }

    fn require_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !self.directories.contains(parent) => {
                Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("parent directory {} does not exist", parent.display()),
                ))
            }
            _ => Ok(()),
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

/// Re-root `path` from `from` onto `to`, if it lies under `from`.
fn moved(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    path.strip_prefix(from).ok().map(|rest| {
        if rest.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(rest)
        }
    })
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryFilesystemInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryFilesystemInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a directory and all its ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let mut inner = self.write();
        let mut current = PathBuf::new();
        for component in path.as_ref().components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }
        self
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> &Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.write()
            .files
            .insert(path.to_path_buf(), content.as_ref().to_vec());
        self
    }

    /// Add a symlink entry. It is reported by `walk` and never followed.
    pub fn add_symlink(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.write().symlinks.insert(path.to_path_buf());
        self
    }

    /// Mark a file executable.
    pub fn mark_executable(&self, path: impl AsRef<Path>) -> &Self {
        self.write().executables.insert(path.as_ref().to_path_buf());
        self
    }

    /// Make `op` on `path` fail from now on.
    pub fn inject_fault(&self, op: FsOp, path: impl AsRef<Path>) -> &Self {
        self.write().faults.insert((op, path.as_ref().to_path_buf()));
        self
    }

    /// File content (testing helper).
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.read().files.get(path.as_ref()).cloned()
    }

    /// File content as text (testing helper).
    pub fn file_text(&self, path: impl AsRef<Path>) -> Option<String> {
        self.file(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.read().directories.contains(path.as_ref())
    }

    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.read().files.contains_key(path.as_ref())
    }

    /// All file paths, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.read().files.keys().cloned().collect()
    }

    /// All directory paths, sorted.
    pub fn list_dirs(&self) -> Vec<PathBuf> {
        self.read().directories.iter().cloned().collect()
    }
}

impl Filesystem for MemoryFilesystem {
    fn walk(&self, root: &Path, visitor: &mut dyn FnMut(Result<FsEntry, WalkError>) -> WalkControl) {
        // Snapshot first: the visitor hands jobs to workers that take the
        // write lock.
        let entries: Vec<(PathBuf, EntryKind, bool)> = {
            let inner = self.read();
            if !inner.directories.contains(root) {
                drop(inner);
                visitor(Err(WalkError {
                    path: Some(root.to_path_buf()),
                    reason: "no such directory".into(),
                }));
                return;
            }

            let mut entries: BTreeMap<PathBuf, EntryKind> = BTreeMap::new();
            for dir in inner.directories.iter().filter(|p| p.starts_with(root)) {
                entries.insert(dir.clone(), EntryKind::Directory);
            }
            for file in inner.files.keys().filter(|p| p.starts_with(root)) {
                entries.insert(file.clone(), EntryKind::File);
            }
            for link in inner.symlinks.iter().filter(|p| p.starts_with(root)) {
                entries.insert(link.clone(), EntryKind::Other);
            }
            entries
                .into_iter()
                .map(|(path, kind)| {
                    let faulty = inner.faults.contains(&(FsOp::Walk, path.clone()));
                    (path, kind, faulty)
                })
                .collect()
        };

        let mut pruned: Option<PathBuf> = None;
        for (path, kind, faulty) in entries {
            if let Some(prefix) = &pruned {
                if path.starts_with(prefix) {
                    continue;
                }
                pruned = None;
            }

            let control = if faulty {
                // An unreadable directory yields its error and no children.
                if kind.is_dir() {
                    pruned = Some(path.clone());
                }
                visitor(Err(WalkError {
                    path: Some(path),
                    reason: "injected Walk fault".into(),
                }))
            } else {
                let depth = path
                    .strip_prefix(root)
                    .map(|rest| rest.components().count())
                    .unwrap_or(0);
                let control = visitor(Ok(FsEntry {
                    path: path.clone(),
                    kind,
                    depth,
                }));
                if control == WalkControl::SkipSubtree && kind.is_dir() {
                    pruned = Some(path);
                }
                control
            };

            if control == WalkControl::Stop {
                return;
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.read().exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.read().directories.contains(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let inner = self.read();
        inner.check(FsOp::Read, path)?;
        inner.files.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut inner = self.write();
        inner.check(FsOp::Write, path)?;
        inner.require_parent(path)?;
        if inner.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        inner.files.insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.write();
        inner.check(FsOp::Rename, from)?;
        if !inner.exists(from) {
            return Err(not_found(from));
        }
        if inner.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        inner.require_parent(to)?;

        let inner = &mut *inner;
        inner.directories = std::mem::take(&mut inner.directories)
            .into_iter()
            .map(|p| moved(&p, from, to).unwrap_or(p))
            .collect();
        inner.files = std::mem::take(&mut inner.files)
            .into_iter()
            .map(|(p, c)| (moved(&p, from, to).unwrap_or(p), c))
            .collect();
        inner.symlinks = std::mem::take(&mut inner.symlinks)
            .into_iter()
            .map(|p| moved(&p, from, to).unwrap_or(p))
            .collect();
        inner.executables = std::mem::take(&mut inner.executables)
            .into_iter()
            .map(|p| moved(&p, from, to).unwrap_or(p))
            .collect();
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.write();
        inner.check(FsOp::Remove, path)?;
        inner.executables.remove(path);
        if inner.files.remove(path).is_some() || inner.symlinks.remove(path) {
            Ok(())
        } else {
            Err(not_found(path))
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.write();
        inner.check(FsOp::Remove, path)?;
        if !inner.directories.contains(path) {
            return Err(not_found(path));
        }
        inner.directories.retain(|p| !p.starts_with(path));
        inner.files.retain(|p, _| !p.starts_with(path));
        inner.symlinks.retain(|p| !p.starts_with(path));
        inner.executables.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> io::Result<bool> {
        let inner = self.read();
        if !inner.exists(path) {
            return Err(not_found(path));
        }
        Ok(inner.executables.contains(path))
    }

    fn set_permissions(&self, path: &Path, executable: bool) -> io::Result<()> {
        let mut inner = self.write();
        if !inner.exists(path) {
            return Err(not_found(path));
        }
        if executable {
            inner.executables.insert(path.to_path_buf());
        } else {
            inner.executables.remove(path);
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.write();
        inner.check(FsOp::Read, from)?;
        inner.check(FsOp::Write, to)?;
        inner.require_parent(to)?;
        let content = inner.files.get(from).cloned().ok_or_else(|| not_found(from))?;
        inner.files.insert(to.to_path_buf(), content);
        if inner.executables.contains(from) {
            inner.executables.insert(to.to_path_buf());
        }
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.read().files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            ));
        }
        self.add_dir(path);
        Ok(())
    }
}
