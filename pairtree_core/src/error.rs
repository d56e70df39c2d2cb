use std::io;
use std::path::PathBuf;

pub type PairtreeResult<T, E = PairtreeError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum PairtreeError {
    #[error("cannot decode clean identifier {input:?}: {reason}")]
    Decode { input: String, reason: &'static str },
    #[error("malformed pair path {path:?}: {reason}")]
    MalformedPath { path: String, reason: String },
    #[error("prefix marker {marker:?} records {found:?}, expected {expected:?}")]
    PrefixMismatch {
        marker: PathBuf,
        expected: String,
        found: String,
    },
    #[error("could not create directory {path:?}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("prefix {prefix:?} is not a prefix of identifier {identifier:?}")]
    PrefixNotApplicable { prefix: String, identifier: String },
    #[error("identifier is empty")]
    EmptyIdentifier,
    #[error("path {path:?} does not start with root {root:?}")]
    NotUnderRoot { path: String, root: String },
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PairtreeError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        PairtreeError::MalformedPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PairtreeError::Io {
            path: path.into(),
            source,
        }
    }
}
