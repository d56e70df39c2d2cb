use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::codec::PairtreeCodec;

/// Where a storage root lives and how its identifiers are rendered.
///
/// ```toml
/// parent_dir = "/var/lib/pairtree"
/// prefix = "ark:/13030/"
/// separator = "/"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PairtreeConfig {
    /// Directory holding `pairtree_root` and the marker files.
    pub parent_dir: PathBuf,
    /// Shared prefix stripped from every identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Separator used when pair paths are rendered as strings.
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_separator() -> char {
    '/'
}

impl PairtreeConfig {
    pub fn new(parent_dir: impl Into<PathBuf>) -> Self {
        Self {
            parent_dir: parent_dir.into(),
            prefix: None,
            separator: default_separator(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn codec(&self) -> PairtreeCodec {
        PairtreeCodec::new(self.separator)
    }
}
