//! Probing and removal of link artifacts
//!
//! A link artifact is a symbolic link, a junction (which the standard
//! library reports as a symlink on Windows), or a hard link whose file
//! identity matches a known source. Real files and directories are never
//! link artifacts and are never removed by this module.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// What currently occupies a path, inspected without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Nothing exists at the path
    Missing,
    /// A symbolic link or junction (possibly dangling)
    Link,
    /// A real directory
    Directory,
    /// A regular file (which may be a hard link)
    File,
}

/// Inspect `path` without following links.
pub fn probe(path: &Path) -> std::io::Result<ArtifactKind> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let file_type = meta.file_type();
            Ok(if file_type.is_symlink() {
                ArtifactKind::Link
            } else if file_type.is_dir() {
                ArtifactKind::Directory
            } else {
                ArtifactKind::File
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ArtifactKind::Missing),
        Err(e) => Err(e),
    }
}

/// Whether `path` is a link artifact.
///
/// Symlinks and junctions always qualify. A regular file qualifies only when
/// `source` is given and both paths refer to the same underlying file, which
/// is how a hard link created by the organizer is recognized.
pub fn is_link_artifact(path: &Path, source: Option<&Path>) -> std::io::Result<bool> {
    Ok(match probe(path)? {
        ArtifactKind::Link => true,
        ArtifactKind::File => source.is_some_and(|src| same_file(path, src)),
        ArtifactKind::Missing | ArtifactKind::Directory => false,
    })
}

/// Remove a link artifact without touching what it points to.
///
/// Directory symlinks and junctions on Windows must be removed as
/// directories; `remove_dir` on a reparse point never recurses into the
/// target.
pub fn remove_artifact(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if cfg!(windows) => fs::remove_dir(path).map_err(|_| e),
        Err(e) => Err(e),
    }
}

/// Remove empty directories from `start` upward, stopping at (and never
/// removing) `stop_at`, at the first non-empty directory, or when leaving
/// the `stop_at` subtree. Returns the number of directories removed.
pub fn remove_empty_parents(start: &Path, stop_at: &Path) -> usize {
    let mut removed = 0;
    let mut current = start.to_path_buf();

    while current != stop_at && current.starts_with(stop_at) {
        let is_empty = match fs::read_dir(&current) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => break,
        };
        if !is_empty || fs::remove_dir(&current).is_err() {
            break;
        }
        tracing::debug!(dir = %current.display(), "Removed empty view directory");
        removed += 1;

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    removed
}

#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

// File identity is not exposed on stable std for non-Unix targets; size and
// timestamps of two hard links to one file are always identical.
#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => {
            ma.len() == mb.len()
                && ma.modified().ok() == mb.modified().ok()
                && ma.created().ok() == mb.created().ok()
        }
        _ => false,
    }
}
