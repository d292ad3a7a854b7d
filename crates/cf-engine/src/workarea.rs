//! Cross-process lock on the working-area root.
//!
//! Two orchestration runs sharing a working area would race on each other's
//! tool folders. The lock is a create-new marker file removed on drop.

use crate::error::{EngineError, EngineResult};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

const LOCK_FILE_NAME: &str = ".cosim.lock";

#[derive(Debug)]
pub struct WorkAreaLock {
    path: PathBuf,
}

impl WorkAreaLock {
    pub fn acquire(work_root: &Path) -> EngineResult<Self> {
        std::fs::create_dir_all(work_root)?;
        let path = work_root.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(EngineError::WorkAreaLocked {
                path: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for WorkAreaLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "failed to remove lock file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let lock = WorkAreaLock::acquire(dir.path()).unwrap();
        let err = WorkAreaLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::WorkAreaLocked { .. }));

        drop(lock);
        WorkAreaLock::acquire(dir.path()).unwrap();
    }
}
