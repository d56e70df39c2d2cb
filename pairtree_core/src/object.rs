use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::codec::{clean, pair_segments};
use crate::error::{PairtreeError, PairtreeResult};
use crate::fs::Filesystem;
use crate::root::StorageRoot;

/// The directory of one identifier below a storage root.
///
/// Equality and hashing only look at the resolved absolute path.
#[derive(Debug, Clone)]
pub struct StorageObject {
    path: PathBuf,
    identifier: String,
    clean_id: String,
    pair_path: String,
}

impl StorageObject {
    /// Creates the object directory for `identifier`, including every
    /// missing parent.
    ///
    /// When `prefix` is given it is stripped from `identifier` before
    /// encoding.
    pub fn create<F: Filesystem>(
        root: &StorageRoot<F>,
        identifier: &str,
        prefix: Option<&str>,
    ) -> PairtreeResult<Self> {
        let stripped = strip_prefix(identifier, prefix)?;
        let clean_id = clean(stripped);
        let location = object_location(root.path(), &clean_id)?;

        let fs = root.fs();
        fs.create_dir_all(&location)
            .map_err(|source| PairtreeError::DirectoryCreation {
                path: location.clone(),
                source,
            })?;
        let path = fs
            .canonicalize(&location)
            .map_err(|source| PairtreeError::io(&location, source))?;
        let pair_path = root
            .codec()
            .pair_path_for(None, stripped, Some(&clean_id))?;
        debug!(identifier, path = %path.display(), "created object directory");

        Ok(Self {
            path,
            identifier: identifier.to_owned(),
            clean_id,
            pair_path,
        })
    }

    /// Resolved absolute path of the object directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier as supplied, shared prefix included.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn clean_id(&self) -> &str {
        &self.clean_id
    }

    /// Path relative to the storage root, encapsulating directory included.
    pub fn pair_path(&self) -> &str {
        &self.pair_path
    }
}

impl PartialEq for StorageObject {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for StorageObject {}

impl Hash for StorageObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

pub(crate) fn strip_prefix<'a>(
    identifier: &'a str,
    prefix: Option<&str>,
) -> PairtreeResult<&'a str> {
    match prefix {
        Some(prefix) => {
            identifier
                .strip_prefix(prefix)
                .ok_or_else(|| PairtreeError::PrefixNotApplicable {
                    prefix: prefix.to_owned(),
                    identifier: identifier.to_owned(),
                })
        }
        None => Ok(identifier),
    }
}

/// `root / pairs... / clean_id`
pub(crate) fn object_location(root: &Path, clean_id: &str) -> PairtreeResult<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in pair_segments(clean_id)? {
        path.push(segment);
    }
    path.push(clean_id);
    Ok(path)
}
