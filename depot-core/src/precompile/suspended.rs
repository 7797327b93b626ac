//! Persistent suspended-package list (`spec.md §4.8`, §9 "Precompile suspension"): packages that
//! errored on a prior precompile run, keyed by (active project path, toolchain version) so a
//! suspension from one environment or one toolchain upgrade doesn't leak into another.

use depot_internal::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

fn key(project_path: &str, toolchain_version: &str) -> String {
    format!("{project_path}|{toolchain_version}")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedList(BTreeMap<String, BTreeSet<String>>);

impl SuspendedList {
    /// A `ParseFailure` here is treated as an empty list; a suspension file is a performance
    /// hint, never load-bearing for correctness.
    #[must_use]
    pub fn read(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&text) {
            Ok(list) => list,
            Err(err) => {
                log::warn!("could not parse `{}`: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(&self.0)?;
        atomic_write(path, &text)
    }

    #[must_use]
    pub fn is_suspended(&self, project_path: &str, toolchain_version: &str, package_name: &str) -> bool {
        self.0
            .get(&key(project_path, toolchain_version))
            .is_some_and(|names| names.contains(package_name))
    }

    pub fn suspend(&mut self, project_path: &str, toolchain_version: &str, package_name: &str) {
        self.0
            .entry(key(project_path, toolchain_version))
            .or_default()
            .insert(package_name.to_owned());
    }

    pub fn clear_suspension(&mut self, project_path: &str, toolchain_version: &str, package_name: &str) {
        if let Some(names) = self.0.get_mut(&key(project_path, toolchain_version)) {
            names.remove(package_name);
        }
    }

    /// Invoked when the user explicitly runs precompile (not an implicit post-mutation run):
    /// the whole entry for this environment is dropped so every package gets a fresh attempt.
    pub fn clear_all(&mut self, project_path: &str, toolchain_version: &str) {
        self.0.remove(&key(project_path, toolchain_version));
    }
}
