//! Per-key advisory lock serialising create + install across threads and processes.

use fs4::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{EnvError, Result};

/// Exclusive lock on one environment key; released on drop.
#[derive(Debug)]
pub struct KeyLock {
    file: File,
    path: PathBuf,
}

impl KeyLock {
    /// Block until the lock file at `path` is exclusively held.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_err = |source: std::io::Error| EnvError::Lock {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        tracing::debug!(lock = %path.display(), "acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        // The lock file stays: deleting it would let a waiter lock an unlinked
        // inode while a newcomer locks a fresh file.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_creates_parent_and_is_reusable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("locks").join("demo.lock");
        {
            let lock = KeyLock::acquire(&path).unwrap();
            assert_eq!(lock.path(), path.as_path());
        }
        assert!(path.exists());
        let _again = KeyLock::acquire(&path).unwrap();
    }

    #[test]
    fn test_second_holder_waits_for_release() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("demo.lock");
        let first = KeyLock::acquire(&path).unwrap();

        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let path = path.clone();
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let _lock = KeyLock::acquire(&path).unwrap();
                acquired.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(200));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(first);
        waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
    }
}
