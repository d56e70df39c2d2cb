use std::io;
use std::path::{Path, PathBuf};

/// One entry returned by [`Filesystem::list_dir`] or [`Filesystem::walk`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Filesystem primitives consumed by the storage root.
///
/// All operations are blocking and take full paths.
pub trait Filesystem: std::fmt::Debug + Send + Sync + 'static {
    fn exists(&self, path: &Path) -> io::Result<bool>;

    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Creates `path` and all missing parents. Succeeds if `path` already
    /// is a directory.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replaces the contents of the file at `path`. The parent directory
    /// must exist.
    fn write_string(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Lists the direct children of a directory.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Lists every entry below `path`, excluding `path` itself.
    fn walk(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        let mut pending = vec![path.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in self.list_dir(&dir)? {
                if entry.is_dir {
                    pending.push(entry.path.clone());
                }
                out.push(entry);
            }
        }
        Ok(out)
    }

    /// Resolves `path` to an absolute form. The path must exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}
