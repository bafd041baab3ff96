//! Local filesystem adapter using std::fs and walkdir.

use std::fs;
use std::io;
use std::path::Path;

use butler_core::{
    application::ports::{Filesystem, FsEntry, WalkControl, WalkError},
    domain::EntryKind,
};
use walkdir::WalkDir;

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn walk(&self, root: &Path, visitor: &mut dyn FnMut(Result<FsEntry, WalkError>) -> WalkControl) {
        let mut entries = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let err = WalkError {
                        path: err.path().map(Path::to_path_buf),
                        reason: err
                            .io_error()
                            .map_or_else(|| err.to_string(), ToString::to_string),
                    };
                    if visitor(Err(err)) == WalkControl::Stop {
                        break;
                    }
                    continue;
                }
            };

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            let control = visitor(Ok(FsEntry {
                path: entry.path().to_path_buf(),
                kind,
                depth: entry.depth(),
            }));
            match control {
                WalkControl::Continue => {}
                // skip_current_dir on a file would skip its siblings
                WalkControl::SkipSubtree if kind.is_dir() => entries.skip_current_dir(),
                WalkControl::SkipSubtree => {}
                WalkControl::Stop => break,
            }
        }
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        fs::write(path, content)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        // fs::rename silently replaces files and empty directories
        if self.exists(to) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ));
        }
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn is_executable(&self, path: &Path) -> io::Result<bool> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(fs::metadata(path)?.permissions().mode() & 0o111 != 0)
        }
        #[cfg(not(unix))]
        {
            fs::metadata(path).map(|_| false)
        }
    }

    fn set_permissions(&self, path: &Path, executable: bool) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            let mode = perms.mode();
            perms.set_mode(if executable {
                mode | 0o111
            } else {
                mode & !0o111
            });
            fs::set_permissions(path, perms)
        }
        #[cfg(not(unix))]
        {
            // No executable bit outside unix
            let _ = executable;
            fs::metadata(path).map(|_| ())
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a/deep")).unwrap();
        fs::create_dir_all(root.join("skip/inner")).unwrap();
        fs::write(root.join("a/deep/f.txt"), "x").unwrap();
        fs::write(root.join("a/g.txt"), "y").unwrap();
        fs::write(root.join("skip/inner/h.txt"), "z").unwrap();
        fs::write(root.join("top.txt"), "t").unwrap();
        dir
    }

    fn collect(root: &Path, prune: &str) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        LocalFilesystem::new().walk(root, &mut |entry| {
            let entry = entry.unwrap();
            let rel = entry.path.strip_prefix(root).unwrap().to_path_buf();
            seen.push(rel.clone());
            if rel == Path::new(prune) {
                WalkControl::SkipSubtree
            } else {
                WalkControl::Continue
            }
        });
        seen
    }

    #[test]
    fn walk_is_top_down_and_sorted() {
        let dir = tree();
        let seen = collect(dir.path(), "no-such-entry");
        let pos = |p: &str| seen.iter().position(|s| s == Path::new(p)).unwrap();
        assert_eq!(pos(""), 0);
        assert!(pos("a") < pos("a/deep"));
        assert!(pos("a/deep") < pos("a/deep/f.txt"));
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn skip_subtree_prunes_only_that_directory() {
        let dir = tree();
        let seen = collect(dir.path(), "skip");
        assert!(seen.contains(&PathBuf::from("skip")));
        assert!(!seen.contains(&PathBuf::from("skip/inner")));
        assert!(seen.contains(&PathBuf::from("top.txt")));
    }

    #[test]
    fn skip_subtree_on_a_file_keeps_siblings() {
        let dir = tree();
        let seen = collect(dir.path(), "a/deep/f.txt");
        assert!(seen.contains(&PathBuf::from("a/g.txt")));
    }

    #[test]
    fn rename_refuses_existing_destination() {
        let dir = tree();
        let fs_ = LocalFilesystem::new();
        let err = fs_
            .rename(&dir.path().join("a"), &dir.path().join("skip"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(dir.path().join("a/g.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_round_trips() {
        let dir = tree();
        let fs_ = LocalFilesystem::new();
        let file = dir.path().join("top.txt");
        assert!(!fs_.is_executable(&file).unwrap());
        fs_.set_permissions(&file, true).unwrap();
        assert!(fs_.is_executable(&file).unwrap());
        fs_.set_permissions(&file, false).unwrap();
        assert!(!fs_.is_executable(&file).unwrap());
    }
}
