//! Test utilities for `Filesystem` implementations.
//!
//! This module provides a test suite that can be run against any
//! `Filesystem` implementation to verify it behaves like `std::fs` where the
//! storage root depends on it.
//!
//! # Usage
//!
//! In your backend crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! pairtree_core = { workspace = true, features = ["testutil"] }
//! ```
//!
//! In your test file:
//!
//! ```ignore
//! use pairtree_core::testutil::FilesystemTests;
//!
//! #[test]
//! fn test_my_fs() {
//!     let fs = MyFs::new(...);
//!     FilesystemTests::new(&fs, scratch_dir).run_all().unwrap();
//! }
//! ```

use crate::fs::{DirEntry, Filesystem};
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};

/// Test suite for `Filesystem` implementations.
pub struct FilesystemTests<'a, F> {
    fs: &'a F,
    /// Scratch directory for this run, unique per suite
    base: PathBuf,
}

impl<'a, F: Filesystem> FilesystemTests<'a, F> {
    /// Create a new test suite working below `scratch`.
    pub fn new(fs: &'a F, scratch: &Path) -> Self {
        let base = scratch.join(format!("_test_{}", rand::rng().random::<u32>()));
        Self { fs, base }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Run all tests.
    pub fn run_all(&self) -> io::Result<()> {
        self.fs.create_dir_all(&self.base)?;

        self.test_create_dir_all()?;
        self.test_write_read()?;
        self.test_overwrite()?;
        self.test_exists()?;
        self.test_remove_file()?;
        self.test_remove_dir()?;
        self.test_remove_dir_all()?;
        self.test_list_dir()?;
        self.test_walk()?;
        self.test_canonicalize()?;
        self.test_create_dir_over_file()?;
        self.test_write_without_parent()?;

        // Cleanup
        self.cleanup()?;

        Ok(())
    }

    /// Nested directories are created in one call, repeatedly.
    pub fn test_create_dir_all(&self) -> io::Result<()> {
        let dir = self.path("mkdir/a/b/c");
        self.fs.create_dir_all(&dir)?;
        self.fs.create_dir_all(&dir)?;

        assert!(self.fs.is_dir(&dir)?, "leaf should be a directory");
        assert!(
            self.fs.is_dir(&self.path("mkdir/a/b"))?,
            "parents should be directories"
        );
        Ok(())
    }

    pub fn test_write_read(&self) -> io::Result<()> {
        let file = self.path("write_read.txt");
        self.fs.write_string(&file, "hello, pairtree\n")?;

        assert_eq!(self.fs.read_to_string(&file)?, "hello, pairtree\n");
        assert!(!self.fs.is_dir(&file)?, "a file is not a directory");
        Ok(())
    }

    pub fn test_overwrite(&self) -> io::Result<()> {
        let file = self.path("overwrite.txt");
        self.fs.write_string(&file, "original content")?;
        self.fs.write_string(&file, "new")?;

        assert_eq!(
            self.fs.read_to_string(&file)?,
            "new",
            "overwritten content should be new"
        );
        Ok(())
    }

    pub fn test_exists(&self) -> io::Result<()> {
        let file = self.path("exists.txt");
        assert!(!self.fs.exists(&file)?, "file should not exist yet");
        assert!(!self.fs.is_dir(&file)?, "missing path is not a directory");

        self.fs.write_string(&file, "x")?;
        assert!(self.fs.exists(&file)?, "file should exist after write");
        Ok(())
    }

    pub fn test_remove_file(&self) -> io::Result<()> {
        let file = self.path("remove.txt");
        self.fs.write_string(&file, "to be deleted")?;
        self.fs.remove_file(&file)?;

        assert!(!self.fs.exists(&file)?, "file should be gone");
        let err = self
            .fs
            .remove_file(&file)
            .expect_err("removing a missing file should fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        Ok(())
    }

    /// Only empty directories can be removed with `remove_dir`.
    pub fn test_remove_dir(&self) -> io::Result<()> {
        let dir = self.path("rmdir");
        let child = dir.join("child.txt");
        self.fs.create_dir_all(&dir)?;
        self.fs.write_string(&child, "x")?;

        assert!(
            self.fs.remove_dir(&dir).is_err(),
            "non-empty directory should not be removed"
        );
        self.fs.remove_file(&child)?;
        self.fs.remove_dir(&dir)?;
        assert!(!self.fs.exists(&dir)?);
        Ok(())
    }

    pub fn test_remove_dir_all(&self) -> io::Result<()> {
        let dir = self.path("rmtree");
        self.fs.create_dir_all(&dir.join("a/b"))?;
        self.fs.write_string(&dir.join("a/b/file.txt"), "x")?;
        self.fs.write_string(&dir.join("top.txt"), "x")?;

        self.fs.remove_dir_all(&dir)?;
        assert!(!self.fs.exists(&dir)?, "tree should be gone");
        assert!(!self.fs.exists(&dir.join("a/b/file.txt"))?);
        Ok(())
    }

    pub fn test_list_dir(&self) -> io::Result<()> {
        let dir = self.path("list");
        self.fs.create_dir_all(&dir.join("sub"))?;
        self.fs.write_string(&dir.join("a.txt"), "a")?;
        self.fs.write_string(&dir.join("b.txt"), "b")?;
        self.fs.write_string(&dir.join("sub/nested.txt"), "n")?;

        let mut entries = self.fs.list_dir(&dir)?;
        entries.sort();
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    path: dir.join("a.txt"),
                    is_dir: false
                },
                DirEntry {
                    path: dir.join("b.txt"),
                    is_dir: false
                },
                DirEntry {
                    path: dir.join("sub"),
                    is_dir: true
                },
            ],
            "list should only contain direct children"
        );
        Ok(())
    }

    pub fn test_walk(&self) -> io::Result<()> {
        let dir = self.path("walk");
        self.fs.create_dir_all(&dir.join("ab/cd/abcd"))?;
        self.fs.write_string(&dir.join("ab/cd/abcd/data.txt"), "x")?;

        let mut paths: Vec<PathBuf> = self
            .fs
            .walk(&dir)?
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                dir.join("ab"),
                dir.join("ab/cd"),
                dir.join("ab/cd/abcd"),
                dir.join("ab/cd/abcd/data.txt"),
            ],
            "walk should visit every entry below the start"
        );
        Ok(())
    }

    pub fn test_canonicalize(&self) -> io::Result<()> {
        let dir = self.path("canon");
        self.fs.create_dir_all(&dir.join("x"))?;
        self.fs.create_dir_all(&dir.join("y"))?;

        let direct = self.fs.canonicalize(&dir.join("y"))?;
        let roundabout = self.fs.canonicalize(&dir.join("x/../y/."))?;
        assert!(direct.is_absolute(), "canonical paths are absolute");
        assert_eq!(direct, roundabout);

        let err = self
            .fs
            .canonicalize(&dir.join("missing"))
            .expect_err("missing paths cannot be canonicalized");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        Ok(())
    }

    /// A file blocks directory creation at its own path and below it.
    pub fn test_create_dir_over_file(&self) -> io::Result<()> {
        let file = self.path("blocker");
        self.fs.write_string(&file, "x")?;

        assert!(self.fs.create_dir_all(&file).is_err());
        assert!(self.fs.create_dir_all(&file.join("child")).is_err());
        Ok(())
    }

    pub fn test_write_without_parent(&self) -> io::Result<()> {
        let file = self.path("no/such/parent.txt");
        assert!(self.fs.write_string(&file, "x").is_err());
        Ok(())
    }

    /// Clean up test files.
    pub fn cleanup(&self) -> io::Result<()> {
        self.fs.remove_dir_all(&self.base)
    }
}

/// Characters that exercise every branch of the escape table.
const INTERESTING: &[char] = &[
    '/', ':', '.', '^', '+', '=', ',', '*', '?', '"', '<', '>', '|', '\\', ' ', '\t', '\n', '\0',
    '\u{7f}', 'é', '中', '🦀',
];

/// Generate a random identifier of at most `max_len` characters.
pub fn random_identifier<R: Rng + ?Sized>(rng: &mut R, max_len: usize) -> String {
    let len = rng.random_range(0..=max_len);
    (0..len)
        .map(|_| match rng.random_range(0..3) {
            0 => INTERESTING[rng.random_range(0..INTERESTING.len())],
            1 => rng.random_range('!'..='~'),
            _ => rng.random::<char>(),
        })
        .collect()
}
