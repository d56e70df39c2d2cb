use pairtree_core::fs::{DirEntry, Filesystem};
use pairtree_core::{PairtreeConfig, PairtreeResult, StorageRoot};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Storage root on the local disk.
pub type LocalStorageRoot = StorageRoot<LocalFs>;

/// The `[local]` table of the CLI config file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalFsConfig {
    /// Flush marker files to disk before renaming them into place.
    #[serde(default = "default_sync")]
    pub sync_writes: bool,
}

fn default_sync() -> bool {
    true
}

impl Default for LocalFsConfig {
    fn default() -> Self {
        Self {
            sync_writes: default_sync(),
        }
    }
}

/// `Filesystem` backed by `std::fs`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    sync_writes: bool,
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFs {
    pub fn new() -> Self {
        Self::create(LocalFsConfig::default())
    }

    pub fn create(config: LocalFsConfig) -> Self {
        LocalFs {
            sync_writes: config.sync_writes,
        }
    }

    /// Opens the storage root described by `config` on the local disk.
    pub fn open_root(self, config: &PairtreeConfig) -> PairtreeResult<LocalStorageRoot> {
        StorageRoot::open(self, config)
    }

    fn write_tmp(&self, tmp_path: &Path, contents: &str) -> io::Result<()> {
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        tmp.write_all(contents.as_bytes())?;
        if self.sync_writes {
            tmp.sync_all()?;
        }
        Ok(())
    }
}

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    /// Writes a temporary sibling and renames it over `path`.
    fn write_string(&self, path: &Path, contents: &str) -> io::Result<()> {
        let tmp_path = path.with_extension("tmp");
        let result = self
            .write_tmp(&tmp_path, contents)
            .and_then(|()| fs::rename(&tmp_path, path));
        if let Err(err) = result {
            // Best effort.
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        trace!(path = %path.display(), "replaced file");
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        fs::read_dir(path)?
            .map(|entry| {
                let entry = entry?;
                Ok(DirEntry {
                    path: entry.path(),
                    is_dir: entry.file_type()?.is_dir(),
                })
            })
            .collect()
    }

    fn walk(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        WalkDir::new(path)
            .min_depth(1)
            .into_iter()
            .map(|entry| {
                let entry = entry?;
                Ok(DirEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                })
            })
            .collect()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}
