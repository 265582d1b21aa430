//! Mapping → link artifact

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use vorg_fs::{ArtifactKind, NormalizedPath, is_link_artifact, probe, remove_artifact};

use super::strategy::{SourceKind, StrategyLadder};
use super::{absolute_root, display};
use crate::ledger::{LinkKind, LinkTransaction, TransactionLog};
use crate::rules::validate_view_name;
use crate::views::Mapping;
use crate::Result;

/// Outcome of one `create_links` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    pub batch_id: Uuid,
    /// Links created (or, in a dry run, that would be created)
    pub created: usize,
    pub errors: usize,
    pub dry_run: bool,
}

/// Creates link artifacts for mappings and records every attempt.
pub struct LinkMaterializer<'a> {
    views_root: PathBuf,
    ladder: StrategyLadder,
    log: &'a mut dyn TransactionLog,
}

impl<'a> LinkMaterializer<'a> {
    /// Materializer using the platform's strategy ladder.
    pub fn new(views_root: impl Into<PathBuf>, log: &'a mut dyn TransactionLog) -> Self {
        Self {
            views_root: absolute_root(views_root.into()),
            ladder: StrategyLadder::for_platform(),
            log,
        }
    }

    pub fn with_ladder(mut self, ladder: StrategyLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn views_root(&self) -> &Path {
        &self.views_root
    }

    /// Materialize `mappings` under `<views_root>/<view_name>/`.
    ///
    /// Per-mapping failures are counted and logged, never raised; the batch
    /// always runs to the end. With `dry_run` nothing on disk changes, every
    /// safe mapping is logged as a simulated success and the rows are
    /// appended as one batch. Targets that are absolute or contain `..` fail
    /// in a dry run as well, so a preview never promises a link the live run
    /// would refuse.
    pub fn create_links(
        &mut self,
        mappings: &[Mapping],
        view_name: &str,
        dry_run: bool,
    ) -> Result<LinkReport> {
        validate_view_name(view_name)?;
        let batch_id = Uuid::new_v4();
        let view_dir = self.views_root.join(view_name);
        let mut report = LinkReport {
            batch_id,
            created: 0,
            errors: 0,
            dry_run,
        };
        let mut simulated = Vec::new();

        for mapping in mappings {
            let pending = |link_path: &str| {
                LinkTransaction::create(batch_id, view_name, &mapping.source_path, link_path)
            };

            let entry = match NormalizedPath::relative(&mapping.target_path) {
                Err(e) => {
                    let link_path = format!("{}/{}", display(&view_dir), mapping.target_path);
                    tracing::error!(target = %mapping.target_path, "Rejected unsafe target path");
                    report.errors += 1;
                    pending(&link_path).failed(e.to_string())
                }
                Ok(target) => {
                    let dest = view_dir.join(target.to_native());
                    let link_path = display(&dest);
                    if dry_run {
                        tracing::info!(source = %mapping.source_path, link = %link_path, "[dry-run] Would link");
                        report.created += 1;
                        pending(&link_path).simulated()
                    } else {
                        match self.materialize(Path::new(&mapping.source_path), &dest, &view_dir) {
                            Ok(kind) => {
                                report.created += 1;
                                pending(&link_path).succeeded(kind)
                            }
                            Err(message) => {
                                tracing::error!(source = %mapping.source_path, link = %link_path, error = %message, "Link failed");
                                report.errors += 1;
                                pending(&link_path).failed(message)
                            }
                        }
                    }
                }
            };

            if dry_run {
                simulated.push(entry);
            } else {
                self.log.append(&entry)?;
            }
        }
        if dry_run {
            self.log.append_all(&simulated)?;
        }

        tracing::info!(
            view = view_name,
            created = report.created,
            errors = report.errors,
            dry_run,
            "Link batch finished"
        );
        Ok(report)
    }

    /// Create one link, returning the kind that worked or the failure text.
    fn materialize(
        &self,
        source: &Path,
        dest: &Path,
        view_dir: &Path,
    ) -> std::result::Result<LinkKind, String> {
        let source = match dunce::canonicalize(source) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(format!("source does not exist: {}", source.display()));
            }
            Err(e) => return Err(format!("cannot resolve source {}: {e}", source.display())),
        };
        let kind = SourceKind::detect(&source).map_err(|e| e.to_string())?;

        ensure_no_link_ancestor(dest, view_dir)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {e}", parent.display()))?;
        }
        clear_destination(dest, &source)?;

        let mut last_error = None;
        for strategy in self.ladder.for_source(kind) {
            match strategy.create(&source, dest) {
                Ok(()) => {
                    tracing::info!(kind = %strategy.kind(), source = %source.display(), link = %dest.display(), "Created link");
                    return Ok(strategy.kind());
                }
                Err(e) => {
                    tracing::warn!(kind = %strategy.kind(), error = %e, "Link strategy failed, trying next");
                    discard_partial(dest).map_err(|cleanup| {
                        format!("{} link failed: {e}; {cleanup}", strategy.kind())
                    })?;
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) => format!("all link strategies failed; last error: {e}"),
            None => "no link strategy available".to_string(),
        })
    }
}

/// Fail when a directory between `view_dir` and `dest` is itself a link,
/// since creating entries through it would write into the link's target.
fn ensure_no_link_ancestor(dest: &Path, view_dir: &Path) -> std::result::Result<(), String> {
    let ancestors = dest
        .ancestors()
        .skip(1)
        .take_while(|dir| *dir != view_dir && dir.starts_with(view_dir));
    for dir in ancestors {
        if probe(dir).map_err(|e| e.to_string())? == ArtifactKind::Link {
            return Err(format!("path crosses a link: {}", dir.display()));
        }
    }
    Ok(())
}

/// Remove whatever a failed strategy left at `dest`.
///
/// The destination was cleared before the ladder started, so anything there
/// now came from the failed attempt. A non-empty directory is left alone and
/// reported.
fn discard_partial(dest: &Path) -> std::result::Result<(), String> {
    let removed = match probe(dest).map_err(|e| e.to_string())? {
        ArtifactKind::Missing => return Ok(()),
        ArtifactKind::Link | ArtifactKind::File => remove_artifact(dest),
        ArtifactKind::Directory => fs::remove_dir(dest),
    };
    removed.map_err(|e| format!("cannot remove partial artifact {}: {e}", dest.display()))?;
    tracing::debug!(link = %dest.display(), "Removed partial artifact");
    Ok(())
}

/// Remove a previous link artifact at `dest`; refuse to touch anything else.
fn clear_destination(dest: &Path, source: &Path) -> std::result::Result<(), String> {
    let occupied = match probe(dest).map_err(|e| e.to_string())? {
        ArtifactKind::Missing => return Ok(()),
        ArtifactKind::Link => true,
        ArtifactKind::File => is_link_artifact(dest, Some(source)).map_err(|e| e.to_string())?,
        ArtifactKind::Directory => false,
    };
    if !occupied {
        return Err(format!("destination exists and is not a link: {}", dest.display()));
    }
    remove_artifact(dest).map_err(|e| format!("cannot replace {}: {e}", dest.display()))?;
    tracing::debug!(link = %dest.display(), "Replaced existing link");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MemoryTransactionLog, Operation};
    use crate::links::strategy::{HardLinkStrategy, LinkStrategy};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        views: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dunce::canonicalize(dir.path()).unwrap();
            let views = root.join("_Views");
            Self {
                _dir: dir,
                root,
                views,
            }
        }

        fn source(&self, name: &str) -> String {
            let path = self.root.join("library").join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, name).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn source_dir(&self, name: &str) -> String {
            let path = self.root.join("library").join(name);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("plan.txt"), "plan").unwrap();
            path.to_string_lossy().into_owned()
        }
    }

    /// Records its name and fails or succeeds by delegating.
    struct Recording {
        name: &'static str,
        calls: Arc<Mutex<Vec<&'static str>>>,
        inner: Option<Box<dyn LinkStrategy>>,
    }

    impl LinkStrategy for Recording {
        fn kind(&self) -> LinkKind {
            self.inner.as_ref().map_or(LinkKind::Symlink, |s| s.kind())
        }

        fn create(&self, source: &Path, dest: &Path) -> io::Result<()> {
            self.calls.lock().unwrap().push(self.name);
            match &self.inner {
                Some(strategy) => strategy.create(source, dest),
                None => Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            }
        }
    }

    /// What a failing strategy leaves behind at the destination.
    enum Leftover {
        File,
        EmptyDir,
        FullDir,
    }

    /// Writes something at the destination, then fails.
    struct LeavesPartial(Leftover);

    impl LinkStrategy for LeavesPartial {
        fn kind(&self) -> LinkKind {
            LinkKind::Junction
        }

        fn create(&self, _source: &Path, dest: &Path) -> io::Result<()> {
            match self.0 {
                Leftover::File => fs::write(dest, "partial")?,
                Leftover::EmptyDir => fs::create_dir(dest)?,
                Leftover::FullDir => {
                    fs::create_dir(dest)?;
                    fs::write(dest.join("stray"), "x")?;
                }
            }
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "privilege not held"))
        }
    }

    #[test]
    fn dry_run_changes_nothing_and_logs_simulated_rows() {
        let fx = Fixture::new();
        let mappings = vec![
            Mapping::new(fx.source("a.pdf"), "Docs/a.pdf", "V"),
            Mapping::new("/does/not/exist", "Docs/b.pdf", "V"),
        ];
        let mut log = MemoryTransactionLog::new();

        for _ in 0..2 {
            let report = LinkMaterializer::new(&fx.views, &mut log)
                .create_links(&mappings, "V", true)
                .unwrap();
            assert_eq!((report.created, report.errors), (2, 0));
        }

        assert!(!fx.views.exists());
        assert_eq!(log.len(), 4);
        assert!(log.entries().iter().all(|e| e.dry_run && e.success));
    }

    #[test]
    fn unsafe_targets_fail_even_in_dry_run() {
        let fx = Fixture::new();
        let mappings = vec![
            Mapping::new(fx.source("a.pdf"), "../escape.pdf", "V"),
            Mapping::new(fx.source("b.pdf"), "/abs/b.pdf", "V"),
        ];
        let mut log = MemoryTransactionLog::new();
        let report = LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", true)
            .unwrap();

        assert_eq!((report.created, report.errors), (0, 2));
        assert!(log.entries().iter().all(|e| !e.success && e.error.is_some()));
    }

    #[test]
    fn invalid_view_name_is_fatal() {
        let fx = Fixture::new();
        let mut log = MemoryTransactionLog::new();
        let result = LinkMaterializer::new(&fx.views, &mut log).create_links(&[], "../V", false);
        assert!(matches!(result, Err(crate::Error::InvalidViewName { .. })));
        assert!(log.is_empty());
    }

    #[test]
    fn falls_back_to_next_strategy_in_order() {
        let fx = Fixture::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let ladder = StrategyLadder::new(
            Vec::new(),
            vec![
                Box::new(Recording {
                    name: "symlink",
                    calls: Arc::clone(&calls),
                    inner: None,
                }),
                Box::new(Recording {
                    name: "hardlink",
                    calls: Arc::clone(&calls),
                    inner: Some(Box::new(HardLinkStrategy)),
                }),
            ],
        );
        let mappings = vec![Mapping::new(fx.source("a.pdf"), "Docs/a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(*calls.lock().unwrap(), vec!["symlink", "hardlink"]);
        assert_eq!(log.entries()[0].link_kind, Some(LinkKind::HardLink));
        assert_eq!(
            fs::read_to_string(fx.views.join("V/Docs/a.pdf")).unwrap(),
            "a.pdf"
        );
    }

    #[test]
    fn exhausted_ladder_reports_last_error() {
        let fx = Fixture::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let failing = |name| -> Box<dyn LinkStrategy> {
            Box::new(Recording {
                name,
                calls: Arc::clone(&calls),
                inner: None,
            })
        };
        let ladder = StrategyLadder::new(Vec::new(), vec![failing("first"), failing("second")]);
        let mappings = vec![Mapping::new(fx.source("a.pdf"), "a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!((report.created, report.errors), (0, 1));
        let entry = &log.entries()[0];
        assert!(entry.error.as_deref().unwrap().contains("denied"));
        assert_eq!(entry.operation, Operation::Create);
    }

    #[test]
    fn missing_source_fails_the_mapping_only() {
        let fx = Fixture::new();
        let mappings = vec![
            Mapping::new(fx.root.join("gone.txt").to_string_lossy(), "gone.txt", "V"),
            Mapping::new(fx.source("a.pdf"), "a.pdf", "V"),
        ];
        let mut log = MemoryTransactionLog::new();
        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(StrategyLadder::new(Vec::new(), vec![Box::new(HardLinkStrategy)]))
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!((report.created, report.errors), (1, 1));
        assert!(log.entries()[0].error.as_deref().unwrap().contains("source does not exist"));
    }

    #[test]
    fn real_file_at_destination_is_never_overwritten() {
        let fx = Fixture::new();
        let dest = fx.views.join("V/a.pdf");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&dest, "precious").unwrap();

        let mappings = vec![Mapping::new(fx.source("a.pdf"), "a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();
        let report = LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(report.errors, 1);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "precious");
        assert!(log.entries()[0].error.as_deref().unwrap().contains("not a link"));
    }

    #[cfg(unix)]
    #[test]
    fn relinking_replaces_existing_links() {
        let fx = Fixture::new();
        let mappings = vec![Mapping::new(fx.source("a.pdf"), "Docs/a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();

        for _ in 0..2 {
            let report = LinkMaterializer::new(&fx.views, &mut log)
                .create_links(&mappings, "V", false)
                .unwrap();
            assert_eq!((report.created, report.errors), (1, 0));
        }

        let dest = fx.views.join("V/Docs/a.pdf");
        assert!(fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(log.entries()[1].link_kind, Some(LinkKind::Symlink));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_at_destination_is_replaced() {
        let fx = Fixture::new();
        let dest = fx.views.join("V/a.pdf");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(fx.root.join("nowhere"), &dest).unwrap();

        let mappings = vec![Mapping::new(fx.source("a.pdf"), "a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();
        let report = LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "a.pdf");
    }

    #[cfg(unix)]
    #[test]
    fn directory_sources_are_linked() {
        let fx = Fixture::new();
        let project = fx.root.join("projects/apollo");
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join("plan.txt"), "plan").unwrap();

        let mappings = vec![Mapping::new(project.to_string_lossy(), "Projects/apollo", "V")];
        let mut log = MemoryTransactionLog::new();
        LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", false)
            .unwrap();

        let linked = fx.views.join("V/Projects/apollo/plan.txt");
        assert_eq!(fs::read_to_string(linked).unwrap(), "plan");
    }

    #[test]
    fn directory_falls_back_from_symlink_to_junction() {
        let fx = Fixture::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let failing = |name| -> Box<dyn LinkStrategy> {
            Box::new(Recording {
                name,
                calls: Arc::clone(&calls),
                inner: None,
            })
        };
        let ladder = StrategyLadder::new(vec![failing("symlink"), failing("junction")], Vec::new());
        let mappings = vec![Mapping::new(fx.source_dir("apollo"), "Projects/apollo", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["symlink", "junction"]);
        assert_eq!((report.created, report.errors), (0, 1));
        assert_eq!(log.len(), 1);
        let error = log.entries()[0].error.as_deref().unwrap();
        assert!(error.starts_with("all link strategies failed"));
    }

    #[test]
    fn failed_attempt_leaves_no_partial_directory() {
        let fx = Fixture::new();
        let ladder = StrategyLadder::new(vec![Box::new(LeavesPartial(Leftover::EmptyDir))], Vec::new());
        let mappings = vec![Mapping::new(fx.source_dir("apollo"), "Projects/apollo", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(report.errors, 1);
        assert!(!fx.views.join("V/Projects/apollo").exists());
        assert!(log.entries()[0].error.as_deref().unwrap().contains("privilege not held"));
    }

    #[test]
    fn partial_file_is_cleared_before_next_strategy() {
        let fx = Fixture::new();
        let ladder = StrategyLadder::new(
            Vec::new(),
            vec![Box::new(LeavesPartial(Leftover::File)), Box::new(HardLinkStrategy)],
        );
        let source = fx.source("a.pdf");
        let mappings = vec![Mapping::new(source.clone(), "Docs/a.pdf", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!((report.created, report.errors), (1, 0));
        let dest = fx.views.join("V/Docs/a.pdf");
        assert!(is_link_artifact(&dest, Some(Path::new(&source))).unwrap());
        assert_eq!(log.entries()[0].link_kind, Some(LinkKind::HardLink));
    }

    #[test]
    fn cleanup_failure_is_reported_in_the_mapping_error() {
        let fx = Fixture::new();
        let ladder = StrategyLadder::new(
            vec![
                Box::new(LeavesPartial(Leftover::FullDir)),
                Box::new(LeavesPartial(Leftover::EmptyDir)),
            ],
            Vec::new(),
        );
        let mappings = vec![Mapping::new(fx.source_dir("apollo"), "apollo", "V")];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .with_ladder(ladder)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!(report.errors, 1);
        let error = log.entries()[0].error.as_deref().unwrap();
        assert!(error.contains("privilege not held"));
        assert!(error.contains("cannot remove partial artifact"));
    }

    #[cfg(unix)]
    #[test]
    fn links_are_never_created_through_a_linked_directory() {
        let fx = Fixture::new();
        let project = fx.source_dir("apollo");
        let mappings = vec![
            Mapping::new(project.clone(), "P", "V"),
            Mapping::new(fx.source("a.pdf"), "P/a.pdf", "V"),
        ];
        let mut log = MemoryTransactionLog::new();

        let report = LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", false)
            .unwrap();

        assert_eq!((report.created, report.errors), (1, 1));
        assert!(!Path::new(&project).join("a.pdf").exists());
        let error = log.entries()[1].error.as_deref().unwrap();
        assert!(error.contains("path crosses a link"));
    }

    #[test]
    fn dry_run_rows_are_appended_once_per_mapping() {
        let fx = Fixture::new();
        let mappings = vec![
            Mapping::new(fx.source("a.pdf"), "a.pdf", "V"),
            Mapping::new(fx.source("b.pdf"), "../b.pdf", "V"),
        ];
        let mut log = MemoryTransactionLog::new();
        LinkMaterializer::new(&fx.views, &mut log)
            .create_links(&mappings, "V", true)
            .unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].success && entries[0].dry_run);
        assert!(!entries[1].success);
    }
}
