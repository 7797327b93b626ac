//! Runtime (`spec.md §9` "Global mutable state" redesign note): the process-wide active-project
//! path, the persistent suspended-package list, and the undo log, recast as one explicit value
//! threaded through every dispatcher call instead of living in statics.

use crate::precompile::SuspendedList;
use crate::undo::UndoLog;
use std::path::{Path, PathBuf};

pub struct Runtime {
    active_project: Option<PathBuf>,
    pub suspended: SuspendedList,
    pub undo_log: UndoLog,
    pub toolchain_version: String,
}

impl Runtime {
    #[must_use]
    pub fn new(toolchain_version: impl Into<String>) -> Self {
        Self {
            active_project: None,
            suspended: SuspendedList::default(),
            undo_log: UndoLog::default(),
            toolchain_version: toolchain_version.into(),
        }
    }

    #[must_use]
    pub fn active_project(&self) -> Option<&Path> {
        self.active_project.as_deref()
    }

    /// `activate(path, new_project)` (`spec.md §4.9`, §9): a scoped acquisition. The returned
    /// guard restores the previous active project when dropped -- on every exit path, including
    /// an early return or panic unwind from the caller's closure -- so callers never need a
    /// matching "deactivate" call.
    pub fn activate(&mut self, path: impl Into<PathBuf>) -> ActivationGuard<'_> {
        let previous = self.active_project.replace(path.into());
        ActivationGuard {
            runtime: self,
            previous,
        }
    }
}

pub struct ActivationGuard<'a> {
    runtime: &'a mut Runtime,
    previous: Option<PathBuf>,
}

impl Drop for ActivationGuard<'_> {
    fn drop(&mut self) {
        self.runtime.active_project = self.previous.take();
    }
}

impl std::ops::Deref for ActivationGuard<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.runtime
    }
}

impl std::ops::DerefMut for ActivationGuard<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.runtime
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn activation_is_visible_while_guard_is_alive() {
        let mut runtime = Runtime::new("1.0.0");
        {
            let guard = runtime.activate("/env/a");
            assert_eq!(guard.active_project(), Some(Path::new("/env/a")));
        }
        assert_eq!(runtime.active_project(), None);
    }

    #[test]
    fn nested_activation_restores_outer_project_on_drop() {
        let mut runtime = Runtime::new("1.0.0");
        let mut outer = runtime.activate("/env/a");
        {
            let inner = outer.activate("/env/b");
            assert_eq!(inner.active_project(), Some(Path::new("/env/b")));
        }
        assert_eq!(outer.active_project(), Some(Path::new("/env/a")));
    }
}
