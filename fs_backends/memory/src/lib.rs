use dashmap::{DashMap, DashSet};
use pairtree_core::fs::{DirEntry, Filesystem};
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File(String),
}

/// In-memory `Filesystem`.
///
/// Paths are resolved lexically against a virtual `/`; relative paths are
/// treated as relative to `/`. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    nodes: Arc<DashMap<PathBuf, Node>>,
    denied: Arc<DashSet<PathBuf>>,
}

impl MemoryFs {
    /// Creates a new, empty `MemoryFs`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later removal of `path` fail with `PermissionDenied`.
    ///
    /// `remove_dir_all` also fails for any ancestor of `path`.
    pub fn deny_removal(&self, path: impl AsRef<Path>) {
        self.denied.insert(normalize(path.as_ref()));
    }

    pub fn allow_removal(&self, path: impl AsRef<Path>) {
        self.denied.remove(&normalize(path.as_ref()));
    }

    /// Number of files and directories, the virtual `/` excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, path: &Path) -> Option<Node> {
        if path == Path::new("/") {
            return Some(Node::Dir);
        }
        self.nodes.get(path).map(|node| node.value().clone())
    }

    fn check_removal(&self, path: &Path, recursive: bool) -> io::Result<()> {
        let denied = self
            .denied
            .iter()
            .any(|denied| *denied == path || (recursive && denied.starts_with(path)));
        if denied {
            return Err(io::Error::new(
                ErrorKind::PermissionDenied,
                format!("removal of {} is denied", path.display()),
            ));
        }
        Ok(())
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("{} not found", path.display()))
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        ErrorKind::NotADirectory,
        format!("{} is not a directory", path.display()),
    )
}

fn is_a_directory(path: &Path) -> io::Error {
    io::Error::new(
        ErrorKind::IsADirectory,
        format!("{} is a directory", path.display()),
    )
}

impl Filesystem for MemoryFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.node(&normalize(path)).is_some())
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(self.node(&normalize(path)) == Some(Node::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut ancestors: Vec<&Path> = path.ancestors().collect();
        ancestors.reverse();
        for dir in ancestors.into_iter().skip(1) {
            let node = self
                .nodes
                .entry(dir.to_path_buf())
                .or_insert(Node::Dir)
                .value()
                .clone();
            if let Node::File(_) = node {
                return Err(if dir == path {
                    io::Error::new(
                        ErrorKind::AlreadyExists,
                        format!("{} exists and is a file", dir.display()),
                    )
                } else {
                    not_a_directory(dir)
                });
            }
        }
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let path = normalize(path);
        match self.node(&path) {
            Some(Node::File(contents)) => Ok(contents),
            Some(Node::Dir) => Err(is_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn write_string(&self, path: &Path, contents: &str) -> io::Result<()> {
        let path = normalize(path);
        let parent = path.parent().ok_or_else(|| is_a_directory(&path))?;
        match self.node(parent) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => return Err(not_a_directory(parent)),
            None => return Err(not_found(parent)),
        }
        if self.node(&path) == Some(Node::Dir) {
            return Err(is_a_directory(&path));
        }
        self.nodes.insert(path, Node::File(contents.to_owned()));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        match self.node(&path) {
            Some(Node::File(_)) => {
                self.check_removal(&path, false)?;
                self.nodes.remove(&path);
                Ok(())
            }
            Some(Node::Dir) => Err(is_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        match self.node(&path) {
            Some(Node::Dir) => {
                self.check_removal(&path, false)?;
                let has_children = self
                    .nodes
                    .iter()
                    .any(|entry| entry.key().parent() == Some(path.as_path()));
                if has_children {
                    return Err(io::Error::new(
                        ErrorKind::DirectoryNotEmpty,
                        format!("{} is not empty", path.display()),
                    ));
                }
                self.nodes.remove(&path);
                Ok(())
            }
            Some(Node::File(_)) => Err(not_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        match self.node(&path) {
            Some(Node::Dir) => {
                self.check_removal(&path, true)?;
                self.nodes.retain(|key, _| !key.starts_with(&path));
                Ok(())
            }
            Some(Node::File(_)) => Err(not_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = normalize(path);
        match self.node(&path) {
            Some(Node::Dir) => Ok(self
                .nodes
                .iter()
                .filter(|entry| entry.key().parent() == Some(path.as_path()))
                .map(|entry| DirEntry {
                    path: entry.key().clone(),
                    is_dir: *entry.value() == Node::Dir,
                })
                .collect()),
            Some(Node::File(_)) => Err(not_a_directory(&path)),
            None => Err(not_found(&path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = normalize(path);
        match self.node(&path) {
            Some(_) => Ok(path),
            None => Err(not_found(&path)),
        }
    }
}
