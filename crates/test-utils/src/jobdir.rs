//! Temporary directories holding job files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::fixtures::jobs;

/// A temporary directory whose path is canonical.
///
/// Job descriptions are canonicalized when read, so rasters registered under
/// [`JobDir::join`] paths resolve to the same keys (macOS puts temp dirs
/// behind a symlink).
pub struct JobDir {
    _dir: TempDir,
    path: PathBuf,
}

impl JobDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().canonicalize().expect("canonicalize temp dir");
        Self { _dir: dir, path }
    }

    /// A directory holding the process file and every fixture job.
    pub fn with_fixtures() -> Self {
        let dir = Self::new();
        dir.write(jobs::PROCESS_FILE, "# tile process\n");
        for (name, contents) in jobs::ALL {
            dir.write(name, contents);
        }
        dir
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write a file and return its path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }
}

impl Default for JobDir {
    fn default() -> Self {
        Self::new()
    }
}
