//! Link creation techniques and the per-source-kind fallback ladder

use std::fs;
use std::io;
use std::path::Path;

use crate::ledger::LinkKind;

/// One way of making `dest` refer to `source`.
pub trait LinkStrategy: Send + Sync {
    /// Kind recorded in the transaction log when this strategy succeeds.
    fn kind(&self) -> LinkKind;

    /// Create the link. `dest` does not exist and its parent does.
    fn create(&self, source: &Path, dest: &Path) -> io::Result<()>;
}

/// Symbolic link (directory or file symlink on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkStrategy;

impl LinkStrategy for SymlinkStrategy {
    fn kind(&self) -> LinkKind {
        LinkKind::Symlink
    }

    #[cfg(unix)]
    fn create(&self, source: &Path, dest: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(source, dest)
    }

    #[cfg(windows)]
    fn create(&self, source: &Path, dest: &Path) -> io::Result<()> {
        if source.is_dir() {
            std::os::windows::fs::symlink_dir(source, dest)
        } else {
            std::os::windows::fs::symlink_file(source, dest)
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn create(&self, _source: &Path, _dest: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported"))
    }
}

/// Hard link; files only, same volume only.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardLinkStrategy;

impl LinkStrategy for HardLinkStrategy {
    fn kind(&self) -> LinkKind {
        LinkKind::HardLink
    }

    fn create(&self, source: &Path, dest: &Path) -> io::Result<()> {
        fs::hard_link(source, dest)
    }
}

/// NTFS directory junction via `mklink /J`; needs no symlink privilege.
#[derive(Debug, Default, Clone, Copy)]
pub struct JunctionStrategy;

/// Appended to junction failures caused by missing privileges.
pub const PRIVILEGE_HINT: &str =
    "run as Administrator or enable Developer Mode to allow link creation";

impl LinkStrategy for JunctionStrategy {
    fn kind(&self) -> LinkKind {
        LinkKind::Junction
    }

    #[cfg(windows)]
    fn create(&self, source: &Path, dest: &Path) -> io::Result<()> {
        let output = std::process::Command::new("cmd")
            .arg("/c")
            .arg("mklink")
            .arg("/J")
            .arg(dest)
            .arg(source)
            .output()?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(junction_error(&stderr))
    }

    #[cfg(not(windows))]
    fn create(&self, _source: &Path, _dest: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "junctions are only available on Windows",
        ))
    }
}

/// Map `mklink` output to an I/O error, adding [`PRIVILEGE_HINT`] when the
/// failure is a privilege problem.
pub fn junction_error(stderr: &str) -> io::Error {
    if stderr.to_lowercase().contains("privilege") {
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("insufficient privileges to create junction ({PRIVILEGE_HINT}): {stderr}"),
        )
    } else {
        io::Error::other(format!("mklink /J failed: {stderr}"))
    }
}

/// Whether a source is a directory or a file (links followed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Directory,
}

impl SourceKind {
    pub fn detect(source: &Path) -> io::Result<Self> {
        Ok(if fs::metadata(source)?.is_dir() {
            Self::Directory
        } else {
            Self::File
        })
    }
}

/// Ordered strategies to try, per source kind.
pub struct StrategyLadder {
    directory: Vec<Box<dyn LinkStrategy>>,
    file: Vec<Box<dyn LinkStrategy>>,
}

impl StrategyLadder {
    /// Directories: symlink, then junction on Windows. Files: symlink, then
    /// hard link.
    pub fn for_platform() -> Self {
        let mut directory: Vec<Box<dyn LinkStrategy>> = vec![Box::new(SymlinkStrategy)];
        if cfg!(windows) {
            directory.push(Box::new(JunctionStrategy));
        }
        Self {
            directory,
            file: vec![Box::new(SymlinkStrategy), Box::new(HardLinkStrategy)],
        }
    }

    pub fn new(directory: Vec<Box<dyn LinkStrategy>>, file: Vec<Box<dyn LinkStrategy>>) -> Self {
        Self { directory, file }
    }

    pub fn for_source(&self, kind: SourceKind) -> &[Box<dyn LinkStrategy>] {
        match kind {
            SourceKind::Directory => &self.directory,
            SourceKind::File => &self.file,
        }
    }
}

impl Default for StrategyLadder {
    fn default() -> Self {
        Self::for_platform()
    }
}

impl std::fmt::Debug for StrategyLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = |items: &[Box<dyn LinkStrategy>]| {
            items.iter().map(|s| s.kind().as_str()).collect::<Vec<_>>()
        };
        f.debug_struct("StrategyLadder")
            .field("directory", &kinds(&self.directory))
            .field("file", &kinds(&self.file))
            .finish()
    }
}
