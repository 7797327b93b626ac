//! Project and Manifest data model (`spec.md §3`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub deps: BTreeMap<String, Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<semver::Version>,
}

impl Project {
    #[must_use]
    pub fn is_self(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSource {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<semver::Version>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "tree-hash")]
    pub tree_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
    #[serde(default)]
    pub deps: BTreeMap<String, Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest(pub BTreeMap<Uuid, ManifestEntry>);

impl Manifest {
    /// `spec.md §3` invariant: every uuid in any entry's `deps` exists as a key in the same
    /// manifest, transitively closed. Transitivity is automatic once the direct invariant holds
    /// for every entry (a dep's own deps are keys of the same manifest, which are themselves
    /// checked), so a single pass over all entries suffices.
    pub fn check_transitively_closed(&self) -> Result<()> {
        for entry in self.0.values() {
            for dep_uuid in entry.deps.values() {
                if !self.0.contains_key(dep_uuid) {
                    return Err(Error::Other(anyhow::anyhow!(
                        "manifest entry `{}` depends on `{}`, which is not in the manifest",
                        entry.name,
                        dep_uuid
                    )));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, uuid: &Uuid) -> Option<&ManifestEntry> {
        self.0.get(uuid)
    }

    pub fn insert(&mut self, uuid: Uuid, entry: ManifestEntry) {
        self.0.insert(uuid, entry);
    }

    pub fn remove(&mut self, uuid: &Uuid) -> Option<ManifestEntry> {
        self.0.remove(uuid)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<(Uuid, &ManifestEntry)> {
        self.0
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(uuid, entry)| (*uuid, entry))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn entry(name: &str, deps: &[(&str, Uuid)]) -> ManifestEntry {
        ManifestEntry {
            name: name.to_owned(),
            deps: deps
                .iter()
                .map(|(n, u)| ((*n).to_owned(), *u))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn closed_manifest_passes() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let mut manifest = Manifest::default();
        manifest.insert(a, entry("A", &[("B", b)]));
        manifest.insert(b, entry("B", &[]));
        manifest.check_transitively_closed().unwrap();
    }

    #[test]
    fn dangling_dep_fails() {
        let a = Uuid::from_u128(1);
        let ghost = Uuid::from_u128(99);
        let mut manifest = Manifest::default();
        manifest.insert(a, entry("A", &[("Ghost", ghost)]));
        assert!(manifest.check_transitively_closed().is_err());
    }
}
