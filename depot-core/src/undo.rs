//! Undo Log (`spec.md §4.3`): a process-wide, per-environment bounded ring of (project,
//! manifest) snapshots.

use crate::env_cache::EnvironmentCache;
use crate::project::{Manifest, Project};
use std::collections::HashMap;
use std::path::PathBuf;

const MAX_ENTRIES: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoSnapshot {
    pub date: String,
    pub project: Project,
    pub manifest: Manifest,
}

#[derive(Default)]
pub struct UndoHistory {
    /// 1-based; index 1 is most recent. 0 means "no current snapshot yet" (fresh environment).
    index: usize,
    entries: Vec<UndoSnapshot>,
}

impl UndoHistory {
    #[must_use]
    pub fn entries(&self) -> &[UndoSnapshot] {
        &self.entries
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.index
    }
}

#[derive(Default)]
pub struct UndoLog {
    histories: HashMap<PathBuf, UndoHistory>,
}

impl UndoLog {
    /// No-op when `(project, manifest)` is unchanged from `original_*`. Otherwise: drop any
    /// entries before the current index (the redo tail), prepend the new snapshot, clamp to
    /// `MAX_ENTRIES`.
    pub fn snapshot(&mut self, cache: &EnvironmentCache, now: &str) {
        if cache.is_unchanged() {
            return;
        }

        let history = self.histories.entry(cache.project_file.clone()).or_default();

        if history.index > 1 {
            history.entries.drain(0..history.index - 1);
        }

        history.entries.insert(
            0,
            UndoSnapshot {
                date: now.to_owned(),
                project: cache.project.clone(),
                manifest: cache.manifest.clone(),
            },
        );
        history.entries.truncate(MAX_ENTRIES);
        history.index = 1;
    }

    /// Moves one step toward older history, returning the snapshot to materialise (or `None`
    /// if already at the oldest entry).
    pub fn undo(&mut self, project_file: &PathBuf) -> Option<UndoSnapshot> {
        let history = self.histories.get_mut(project_file)?;
        if history.index >= history.entries.len() {
            return None;
        }
        history.index += 1;
        history.entries.get(history.index - 1).cloned()
    }

    /// Moves one step toward newer history.
    pub fn redo(&mut self, project_file: &PathBuf) -> Option<UndoSnapshot> {
        let history = self.histories.get_mut(project_file)?;
        if history.index <= 1 {
            return None;
        }
        history.index -= 1;
        history.entries.get(history.index - 1).cloned()
    }

    #[must_use]
    pub fn history(&self, project_file: &PathBuf) -> Option<&UndoHistory> {
        self.histories.get(project_file)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collaborators::ProjectManifestIo;
    use crate::error::Result;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;
    use std::path::Path;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeIo {
        projects: RefCell<StdHashMap<PathBuf, Project>>,
        manifests: RefCell<StdHashMap<PathBuf, Manifest>>,
    }

    impl ProjectManifestIo for FakeIo {
        fn read_project(&self, path: &Path) -> Result<Project> {
            Ok(self.projects.borrow().get(path).cloned().unwrap_or_default())
        }
        fn write_project(&self, path: &Path, project: &Project) -> Result<()> {
            self.projects.borrow_mut().insert(path.to_path_buf(), project.clone());
            Ok(())
        }
        fn read_manifest(&self, path: &Path) -> Result<Manifest> {
            Ok(self.manifests.borrow().get(path).cloned().unwrap_or_default())
        }
        fn write_manifest(&self, path: &Path, manifest: &Manifest) -> Result<()> {
            self.manifests.borrow_mut().insert(path.to_path_buf(), manifest.clone());
            Ok(())
        }
    }

    fn cache() -> (FakeIo, EnvironmentCache) {
        let io = FakeIo::default();
        let cache = EnvironmentCache::load(
            &io,
            Path::new("/env/Project.toml"),
            Path::new("/env/Manifest.toml"),
        )
        .unwrap();
        (io, cache)
    }

    #[test]
    fn snapshot_is_noop_when_unchanged() {
        let (_, cache) = cache();
        let mut log = UndoLog::default();
        log.snapshot(&cache, "2026-01-01");
        assert!(log.history(&cache.project_file).is_none());
    }

    #[test]
    fn snapshot_records_change() {
        let (_, mut cache) = cache();
        cache.project.deps.insert("Foo".to_owned(), Uuid::from_u128(1));
        let mut log = UndoLog::default();
        log.snapshot(&cache, "2026-01-01");
        let history = log.history(&cache.project_file).unwrap();
        assert_eq!(history.entries().len(), 1);
        assert_eq!(history.current_index(), 1);
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let (_, mut cache) = cache();
        let mut log = UndoLog::default();

        cache.project.deps.insert("Foo".to_owned(), Uuid::from_u128(1));
        log.snapshot(&cache, "t1");
        let after_first = cache.project.clone();

        cache.project.deps.insert("Bar".to_owned(), Uuid::from_u128(2));
        log.snapshot(&cache, "t2");
        let after_second = cache.project.clone();

        let undone = log.undo(&cache.project_file).unwrap();
        assert_eq!(undone.project, after_first);

        let redone = log.redo(&cache.project_file).unwrap();
        assert_eq!(redone.project, after_second);
    }

    #[test]
    fn history_is_clamped_to_fifty_entries() {
        let (_, mut cache) = cache();
        let mut log = UndoLog::default();
        for i in 0..60u128 {
            cache.project.deps.insert(format!("Pkg{i}"), Uuid::from_u128(i));
            log.snapshot(&cache, "t");
        }
        assert_eq!(log.history(&cache.project_file).unwrap().entries().len(), 50);
    }

    #[test]
    fn new_snapshot_after_undo_drops_redo_tail() {
        let (_, mut cache) = cache();
        let mut log = UndoLog::default();

        cache.project.deps.insert("A".to_owned(), Uuid::from_u128(1));
        log.snapshot(&cache, "t1");
        cache.project.deps.insert("B".to_owned(), Uuid::from_u128(2));
        log.snapshot(&cache, "t2");

        log.undo(&cache.project_file).unwrap();

        cache.project.deps.insert("C".to_owned(), Uuid::from_u128(3));
        log.snapshot(&cache, "t3");

        // the "B" snapshot (the redo tail) is gone; only "A-then-C" and "A" remain reachable.
        assert_eq!(log.history(&cache.project_file).unwrap().entries().len(), 2);
        assert!(log.redo(&cache.project_file).is_none());
    }
}
