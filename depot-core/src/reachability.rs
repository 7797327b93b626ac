//! Reachability Marker (`spec.md §4.5`): given a set of index files, returns the union of
//! content paths they reference.
//!
//! `mark` is deliberately generic over `process_fn` so the four variants below (package, repo,
//! artifact, scratch) share one traversal/bookkeeping loop. The *ordering* in which the GC
//! driver invokes the variants is load-bearing (packages before artifacts/scratch, §4.5) but
//! that ordering is the driver's concern, not this module's.

use crate::depot::Depot;
use crate::project::Manifest;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub struct MarkResult {
    /// Union of content paths referenced by every "active" index file.
    pub marked: BTreeSet<PathBuf>,
    /// Index files for which `process_fn` returned `Some` (i.e. were readable and not skipped).
    pub active_index_files: BTreeSet<PathBuf>,
}

/// Runs `process_fn` over every index file, unioning whatever it marks. `process_fn` returns
/// `None` for an index file that is unreadable or deliberately skipped.
pub fn mark<F>(index_files: &[PathBuf], mut process_fn: F) -> MarkResult
where
    F: FnMut(&Path) -> Option<Vec<PathBuf>>,
{
    let mut marked = BTreeSet::new();
    let mut active_index_files = BTreeSet::new();

    for index_file in index_files {
        if let Some(paths) = process_fn(index_file) {
            active_index_files.insert(index_file.clone());
            marked.extend(paths);
        }
    }

    MarkResult {
        marked,
        active_index_files,
    }
}

fn read_manifest(path: &Path) -> Option<Manifest> {
    let text = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(err) => {
            log::warn!("could not parse `{}` during gc: {err}", path.display());
            None
        }
    }
}

/// Package mark: for each manifest entry with a tree-hash, yields `packages/<name>/<slug>`.
pub fn package_mark(depot: &Depot) -> impl FnMut(&Path) -> Option<Vec<PathBuf>> + '_ {
    move |index_file| {
        let manifest = read_manifest(index_file)?;
        Some(
            manifest
                .0
                .values()
                .filter_map(|entry| {
                    entry
                        .tree_hash
                        .as_ref()
                        .map(|hash| depot.package_dir(&entry.name, hash))
                })
                .collect(),
        )
    }
}

/// Repo mark: for each manifest entry with `repo.source`, yields `clones/<cache-key(source)>`.
pub fn repo_mark(depot: &Depot) -> impl FnMut(&Path) -> Option<Vec<PathBuf>> + '_ {
    move |index_file| {
        let manifest = read_manifest(index_file)?;
        Some(
            manifest
                .0
                .values()
                .filter_map(|entry| entry.repo.as_ref().map(|repo| depot.clone_dir(&repo.source)))
                .collect(),
        )
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactPlatforms {
    Single {
        #[serde(rename = "git-tree-sha1")]
        git_tree_sha1: String,
    },
    Keyed(Vec<ArtifactPlatformEntry>),
}

#[derive(Deserialize)]
struct ArtifactPlatformEntry {
    #[serde(rename = "git-tree-sha1")]
    git_tree_sha1: String,
}

#[derive(Deserialize)]
struct ArtifactsIndex(BTreeMap<String, ArtifactPlatforms>);

/// Artifact mark: skips an index file that lies under any path already in `packages_to_delete`
/// (so a package slated for deletion doesn't keep its own artifacts alive); otherwise yields
/// `artifacts/<hex(git-tree-sha1)>` for every platform entry.
pub fn artifact_mark<'a>(
    depot: &'a Depot,
    packages_to_delete: &'a BTreeSet<PathBuf>,
) -> impl FnMut(&Path) -> Option<Vec<PathBuf>> + 'a {
    move |index_file| {
        if packages_to_delete
            .iter()
            .any(|pkg_path| index_file.starts_with(pkg_path))
        {
            return None;
        }

        let text = std::fs::read_to_string(index_file).ok()?;
        let index: ArtifactsIndex = match toml::from_str(&text) {
            Ok(index) => index,
            Err(err) => {
                log::warn!("could not parse `{}` during gc: {err}", index_file.display());
                return None;
            }
        };

        Some(
            index
                .0
                .into_values()
                .flat_map(|platforms| match platforms {
                    ArtifactPlatforms::Single { git_tree_sha1 } => vec![git_tree_sha1],
                    ArtifactPlatforms::Keyed(entries) => {
                        entries.into_iter().map(|e| e.git_tree_sha1).collect()
                    }
                })
                .map(|hash| depot.artifact_dir(&hash))
                .collect(),
        )
    }
}

/// Scratch mark: looks up `scratch_dir`'s parent project files across all depots' usage
/// ledgers; if every parent lies under a package scheduled for deletion, skips (the scratch
/// space will itself become an orphan candidate); otherwise yields `scratch_dir` unchanged.
///
/// Unlike the other three variants this isn't `FnMut(&Path) -> Option<Vec<PathBuf>>` shaped by
/// an index *file* -- the "index" here is the scratch directory itself, so it is called
/// directly rather than through [`mark`].
#[must_use]
pub fn scratch_reachable(
    parents: Option<&BTreeSet<String>>,
    packages_to_delete: &BTreeSet<PathBuf>,
) -> bool {
    match parents {
        None => true,
        Some(parents) if parents.is_empty() => true,
        Some(parents) => !parents.iter().all(|parent| {
            packages_to_delete
                .iter()
                .any(|pkg_path| Path::new(parent).starts_with(pkg_path))
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::project::ManifestEntry;
    use uuid::Uuid;

    #[test]
    fn package_mark_yields_slug_path_per_tree_hash_entry() {
        let dir = tempfile::tempdir().unwrap();
        let depot = Depot::new(dir.path());
        let manifest_file = dir.path().join("Manifest.toml");

        let mut manifest = Manifest::default();
        manifest.insert(
            Uuid::from_u128(1),
            ManifestEntry {
                name: "Foo".to_owned(),
                tree_hash: Some("abcdef0123456789abcdef0123456789abcdef01".to_owned()),
                ..Default::default()
            },
        );
        std::fs::write(&manifest_file, toml::to_string(&manifest).unwrap()).unwrap();

        let result = mark(&[manifest_file.clone()], package_mark(&depot));
        assert_eq!(result.active_index_files, [manifest_file].into());
        assert_eq!(
            result.marked,
            [depot.package_dir("Foo", "abcdef0123456789abcdef0123456789abcdef01")].into()
        );
    }

    #[test]
    fn unreadable_index_file_is_inactive_and_marks_nothing() {
        let depot = Depot::new("/depot");
        let result = mark(&[PathBuf::from("/does/not/exist")], package_mark(&depot));
        assert!(result.active_index_files.is_empty());
        assert!(result.marked.is_empty());
    }

    #[test]
    fn artifact_mark_skips_index_under_deleted_package() {
        let dir = tempfile::tempdir().unwrap();
        let depot = Depot::new(dir.path());
        let pkg_dir = depot.package_dir("Foo", "abcdef0123456789abcdef0123456789abcdef01");
        std::fs::create_dir_all(&pkg_dir).unwrap();
        let index_file = pkg_dir.join("Artifacts.toml");
        std::fs::write(&index_file, "").unwrap();

        let mut to_delete = BTreeSet::new();
        to_delete.insert(pkg_dir);

        let result = mark(&[index_file], artifact_mark(&depot, &to_delete));
        assert!(result.active_index_files.is_empty());
    }

    #[test]
    fn scratch_reachable_true_when_no_parents_recorded() {
        assert!(scratch_reachable(None, &BTreeSet::new()));
    }

    #[test]
    fn scratch_unreachable_when_all_parents_under_deleted_packages() {
        let mut to_delete = BTreeSet::new();
        to_delete.insert(PathBuf::from("/depot/packages/Foo/abc"));
        let parents: BTreeSet<String> = ["/depot/packages/Foo/abc/Project.toml".to_owned()].into();
        assert!(!scratch_reachable(Some(&parents), &to_delete));
    }

    #[test]
    fn scratch_reachable_when_any_parent_survives() {
        let mut to_delete = BTreeSet::new();
        to_delete.insert(PathBuf::from("/depot/packages/Foo/abc"));
        let parents: BTreeSet<String> = [
            "/depot/packages/Foo/abc/Project.toml".to_owned(),
            "/home/user/myproject/Project.toml".to_owned(),
        ]
        .into();
        assert!(scratch_reachable(Some(&parents), &to_delete));
    }
}
