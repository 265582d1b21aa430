//! Atomic writes for generated files (mapping interchange, preview reports)

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write `content` to `path` atomically.
///
/// The bytes land in a sibling temp file (same directory, so the rename
/// never crosses a filesystem) that is exclusively locked while written,
/// synced, and then renamed over the destination. A failed write leaves the
/// previous file untouched and removes the temp file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native = path.to_native();

    if let Some(parent) = native.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or("vorg"),
        std::process::id()
    );
    let temp = native.with_file_name(temp_name);

    let result = write_locked(&temp, content).and_then(|()| {
        fs::rename(&temp, &native).map_err(|e| Error::io(&native, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_locked(temp: &Path, content: &[u8]) -> Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp)
        .map_err(|e| Error::io(temp, e))?;

    file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: temp.to_path_buf(),
    })?;
    file.write_all(content).map_err(|e| Error::io(temp, e))?;
    file.sync_all().map_err(|e| Error::io(temp, e))?;
    file.unlock().map_err(|_| Error::LockFailed {
        path: temp.to_path_buf(),
    })?;
    Ok(())
}

/// Read a UTF-8 text file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}

/// Write a UTF-8 text file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
