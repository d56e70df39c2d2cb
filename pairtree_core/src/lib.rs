//! Pairtree identifier codec and storage roots.
//!
//! Pairtree maps arbitrary identifier strings onto directory hierarchies in
//! a reversible way. This crate contains:
//!
//! - The codec (`codec`): cleaning and uncleaning identifiers, splitting
//!   clean identifiers into two-character pair segments and recovering
//!   identifiers and encapsulating directories from pair paths.
//! - Storage roots (`StorageRoot`) and object directories
//!   (`StorageObject`) built on the codec.
//! - The `Filesystem` trait the storage root uses for all I/O;
//!   implementations live in `pairtree_fs_local` and `pairtree_fs_memory`.
//!
//! ```no_run
//! use pairtree_core::codec::{PairtreeCodec, clean};
//!
//! let codec = PairtreeCodec::default();
//! let path = codec.pair_path(&clean("ark:/13030/xt12t3")).unwrap();
//! assert_eq!(path, "ar/k+/=1/30/30/=x/t1/2t/3");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod object;
pub mod root;

// Test utilities (behind feature flag)
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use codec::{PairtreeCodec, clean, unclean};
pub use config::PairtreeConfig;
pub use error::{PairtreeError, PairtreeResult};
pub use fs::{DirEntry, Filesystem};
pub use object::StorageObject;
pub use root::StorageRoot;
