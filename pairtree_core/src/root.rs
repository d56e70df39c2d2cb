//! Storage root lifecycle.
//!
//! A storage root lives inside a parent directory:
//!
//! ```text
//! parent/
//! ├── pairtree_prefix        ← only with a shared prefix
//! ├── pairtree_version0_1
//! └── pairtree_root/
//!     └── ar/k+/=1/30/30/=x/t1/2t/3/ark+=13030=xt12t3/
//! ```
//!
//! Marker files are written once when absent. An existing prefix marker
//! must match the configured prefix. Initialization is a plain
//! check-then-write, so two processes creating the same root at the same
//! time can race.

use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec::{PairtreeCodec, clean, encapsulated_id, unclean};
use crate::config::PairtreeConfig;
use crate::error::{PairtreeError, PairtreeResult};
use crate::fs::Filesystem;
use crate::object::{StorageObject, object_location, strip_prefix};

pub const ROOT_DIR_NAME: &str = "pairtree_root";
pub const VERSION_MARKER_NAME: &str = "pairtree_version0_1";
pub const PREFIX_MARKER_NAME: &str = "pairtree_prefix";
pub const VERSION_MARKER_CONTENTS: &str = "This directory conforms to Pairtree Version 0.1.\n\
Updated spec: https://datatracker.ietf.org/doc/html/draft-kunze-pairtree-01\n";

/// A `pairtree_root` directory with its marker files and optional shared
/// prefix.
///
/// Equality and hashing look at the resolved root path and the prefix.
#[derive(Debug)]
pub struct StorageRoot<F> {
    fs: F,
    parent: PathBuf,
    path: PathBuf,
    prefix: Option<String>,
    codec: PairtreeCodec,
}

impl<F: Filesystem> StorageRoot<F> {
    /// Creates or reopens the storage root inside `parent`.
    pub fn create(fs: F, parent: impl Into<PathBuf>, prefix: Option<&str>) -> PairtreeResult<Self> {
        Self::create_with_codec(fs, parent, prefix, PairtreeCodec::default())
    }

    pub fn open(fs: F, config: &PairtreeConfig) -> PairtreeResult<Self> {
        Self::create_with_codec(
            fs,
            config.parent_dir.clone(),
            config.prefix.as_deref(),
            config.codec(),
        )
    }

    pub fn create_with_codec(
        fs: F,
        parent: impl Into<PathBuf>,
        prefix: Option<&str>,
        codec: PairtreeCodec,
    ) -> PairtreeResult<Self> {
        let parent = parent.into();
        let prefix = prefix.filter(|prefix| !prefix.is_empty());

        if let Some(prefix) = prefix {
            ensure_prefix_marker(&fs, &parent, prefix)?;
        }

        let root = parent.join(ROOT_DIR_NAME);
        fs.create_dir_all(&root)
            .map_err(|source| PairtreeError::DirectoryCreation {
                path: root.clone(),
                source,
            })?;

        let version = parent.join(VERSION_MARKER_NAME);
        if !fs
            .exists(&version)
            .map_err(|source| PairtreeError::io(&version, source))?
        {
            fs.write_string(&version, VERSION_MARKER_CONTENTS)
                .map_err(|source| PairtreeError::io(&version, source))?;
            debug!(path = %version.display(), "wrote version marker");
        }

        let path = fs
            .canonicalize(&root)
            .map_err(|source| PairtreeError::io(&root, source))?;
        let parent = fs
            .canonicalize(&parent)
            .map_err(|source| PairtreeError::io(&parent, source))?;
        info!(root = %path.display(), prefix, "opened pairtree root");

        Ok(Self {
            fs,
            parent,
            path,
            prefix: prefix.map(str::to_owned),
            codec,
        })
    }

    /// Resolved path of the `pairtree_root` directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved path of the directory holding the root and its markers.
    pub fn parent(&self) -> &Path {
        &self.parent
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn codec(&self) -> PairtreeCodec {
        self.codec
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Creates (or finds) the directory of `identifier`.
    pub fn object(&self, identifier: &str) -> PairtreeResult<StorageObject> {
        StorageObject::create(self, identifier, self.prefix())
    }

    /// Where the directory of `identifier` lives, without touching the
    /// filesystem.
    pub fn object_path(&self, identifier: &str) -> PairtreeResult<PathBuf> {
        let stripped = strip_prefix(identifier, self.prefix())?;
        object_location(&self.path, &clean(stripped))
    }

    /// Whether a directory exists at the object location of `identifier`.
    ///
    /// A pair directory can sit where another identifier's object would
    /// live: after storing `0000123` (at `00/00/00/12/3/0000123`),
    /// `contains("00")` is true because `00/00` exists.
    pub fn contains(&self, identifier: &str) -> PairtreeResult<bool> {
        let path = self.object_path(identifier)?;
        self.fs
            .is_dir(&path)
            .map_err(|source| PairtreeError::io(&path, source))
    }

    /// Identifiers of every directory shaped like an object directory,
    /// sorted.
    ///
    /// A directory matches when its name equals the concatenated pairs
    /// above it; anything else is skipped. Pair directories can match too,
    /// so storing `0000123` also lists `00` (see [`Self::contains`]).
    pub fn identifiers(&self) -> PairtreeResult<Vec<String>> {
        let entries = self
            .fs
            .walk(&self.path)
            .map_err(|source| PairtreeError::io(&self.path, source))?;

        let mut ids = Vec::new();
        for entry in entries.into_iter().filter(|entry| entry.is_dir) {
            let Ok(relative) = entry.path.strip_prefix(&self.path) else {
                continue;
            };
            let segments: Option<Vec<&str>> = relative
                .components()
                .map(|component| component.as_os_str().to_str())
                .collect();
            let Some(clean_id) = segments.as_deref().and_then(encapsulated_id) else {
                continue;
            };
            match unclean(clean_id) {
                Ok(id) => ids.push(match &self.prefix {
                    Some(prefix) => format!("{prefix}{id}"),
                    None => id,
                }),
                Err(err) => debug!(path = %entry.path.display(), %err, "skipping directory"),
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Removes the marker files, every object and the root directory.
    ///
    /// Each step is attempted even if an earlier one failed. Returns true
    /// only if all of them succeeded.
    pub fn delete(self) -> bool {
        let mut ok = true;
        let mut step = |what: &str, path: &Path, result: io::Result<()>| {
            if let Err(err) = result {
                warn!(path = %path.display(), %err, "failed to delete {what}");
                ok = false;
            }
        };

        let prefix_marker = self.parent.join(PREFIX_MARKER_NAME);
        match self.fs.exists(&prefix_marker) {
            Ok(true) => step(
                "prefix marker",
                &prefix_marker,
                self.fs.remove_file(&prefix_marker),
            ),
            Ok(false) => {}
            Err(err) => step("prefix marker", &prefix_marker, Err(err)),
        }

        let version_marker = self.parent.join(VERSION_MARKER_NAME);
        step(
            "version marker",
            &version_marker,
            self.fs.remove_file(&version_marker),
        );

        match self.fs.list_dir(&self.path) {
            Ok(entries) => {
                for entry in entries {
                    let result = if entry.is_dir {
                        self.fs.remove_dir_all(&entry.path)
                    } else {
                        self.fs.remove_file(&entry.path)
                    };
                    step("root entry", &entry.path, result);
                }
            }
            Err(err) => step("root entries", &self.path, Err(err)),
        }

        step("root directory", &self.path, self.fs.remove_dir(&self.path));

        if ok {
            info!(root = %self.path.display(), "deleted pairtree root");
        }
        ok
    }
}

fn ensure_prefix_marker<F: Filesystem>(fs: &F, parent: &Path, prefix: &str) -> PairtreeResult<()> {
    let marker = parent.join(PREFIX_MARKER_NAME);
    let exists = fs
        .exists(&marker)
        .map_err(|source| PairtreeError::io(&marker, source))?;

    if exists {
        let contents = fs
            .read_to_string(&marker)
            .map_err(|source| PairtreeError::io(&marker, source))?;
        let found = contents
            .strip_suffix('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .unwrap_or(&contents);
        if found != prefix {
            return Err(PairtreeError::PrefixMismatch {
                marker,
                expected: prefix.to_owned(),
                found: found.to_owned(),
            });
        }
        return Ok(());
    }

    fs.create_dir_all(parent)
        .map_err(|source| PairtreeError::DirectoryCreation {
            path: parent.to_path_buf(),
            source,
        })?;
    fs.write_string(&marker, prefix)
        .map_err(|source| PairtreeError::io(&marker, source))?;
    debug!(path = %marker.display(), prefix, "wrote prefix marker");
    Ok(())
}

impl<F> PartialEq for StorageRoot<F> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.prefix == other.prefix
    }
}

impl<F> Eq for StorageRoot<F> {}

impl<F> Hash for StorageRoot<F> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.prefix.hash(state);
    }
}
