//! Key → on-disk environment layout.

use plugo_core::sanitize_segment;
use std::path::{Path, PathBuf};

/// Directory under the base holding per-key lock files.
const LOCKS_DIR: &str = ".plugo-locks";

/// Maps environment keys to directories under one base directory.
#[derive(Debug, Clone)]
pub struct EnvironmentStore {
    base: PathBuf,
}

impl EnvironmentStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Environment directory for `key`. The key is re-sanitized since callers
    /// may hand in keys from outside [`plugo_core::build_key`].
    pub fn env_dir(&self, key: &str) -> PathBuf {
        self.base.join(sanitize_segment(key))
    }

    /// Interpreter inside an environment directory.
    pub fn interpreter_path(env_dir: &Path) -> PathBuf {
        if cfg!(windows) {
            env_dir.join("Scripts").join("python.exe")
        } else {
            env_dir.join("bin").join("python")
        }
    }

    /// `(env_dir, interpreter)` for `key`.
    pub fn locate(&self, key: &str) -> (PathBuf, PathBuf) {
        let dir = self.env_dir(key);
        let python = Self::interpreter_path(&dir);
        (dir, python)
    }

    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.base
            .join(LOCKS_DIR)
            .join(format!("{}.lock", sanitize_segment(key)))
    }

    /// Whether the environment's interpreter already exists.
    pub fn is_provisioned(&self, key: &str) -> bool {
        self.locate(key).1.exists()
    }
}
