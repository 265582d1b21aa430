//! Advisory lock guarding a views root against concurrent materialization

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result, VorgPath};

/// Exclusive advisory lock on `<views_root>/.vorg.lock`.
///
/// Held for the duration of a link or rollback batch. Acquisition does not
/// block: a second process gets [`Error::LockFailed`] immediately. The lock
/// is released when the guard is dropped.
#[derive(Debug)]
pub struct ViewsLock {
    file: File,
    path: PathBuf,
}

impl ViewsLock {
    /// Try to take the lock for `views_root`, creating the root if needed.
    pub fn acquire(views_root: &Path) -> Result<Self> {
        fs::create_dir_all(views_root).map_err(|e| Error::io(views_root, e))?;

        let path = views_root.join(VorgPath::LockFile.as_str());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| Error::LockFailed { path: path.clone() })?;
        tracing::debug!(lock = %path.display(), "Acquired views lock");

        Ok(Self { file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ViewsLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
