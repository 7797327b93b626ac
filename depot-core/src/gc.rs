//! GC Driver (`spec.md §4.7`): orchestrates Usage Ledger -> Reachability Marker -> Orphanage ->
//! deletion, one pass, in order, across every depot named in a single invocation.

use crate::collaborators::ProgressSink;
use crate::depot::Depot;
use crate::orphanage::{self, OrphanageRecord};
use crate::reachability::{self, artifact_mark, package_mark, repo_mark};
use crate::usage_ledger::UsageLedger;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcSummary {
    pub packages_deleted: usize,
    pub artifacts_deleted: usize,
    pub clones_deleted: usize,
    pub scratchspaces_deleted: usize,
    pub freed_bytes: u64,
}

/// Runs one GC sweep over `depots`. `now` is supplied by the caller rather than sampled here so
/// the driver stays deterministic under test.
pub fn run(
    depots: &[Depot],
    collect_delay: Duration,
    now: DateTime<Utc>,
    progress: &dyn ProgressSink,
) -> anyhow::Result<GcSummary> {
    // Steps 1-3: read, union, existence-filter, and rewrite each depot's usage ledgers.
    let manifest_ledgers = rewrite_filtered(depots, Depot::manifest_usage_log, |path| {
        Path::new(path).is_file()
    });
    let artifact_ledgers = rewrite_filtered(depots, Depot::artifact_usage_log, |path| {
        Path::new(path).is_dir()
    });
    let scratch_ledgers = rewrite_filtered_parents(depots);

    let manifest_union = union(&manifest_ledgers);
    let artifact_union = union(&artifact_ledgers);
    let scratch_union = union(&scratch_ledgers);

    // Step 4: packages-to-keep, read from every environment manifest still recorded in use.
    let manifest_index_files: Vec<PathBuf> =
        manifest_union.0.keys().map(PathBuf::from).collect();

    let mut packages_to_keep = BTreeSet::new();
    for depot in depots {
        packages_to_keep.extend(reachability::mark(&manifest_index_files, package_mark(depot)).marked);
    }

    // Step 5: package candidates, then a stricter preliminary packages_to_delete (zero grace
    // period) solely to feed artifact marking (`spec.md §4.7` step 5, §9 open question).
    let mut package_candidates_by_depot: BTreeMap<&Depot, Vec<PathBuf>> = BTreeMap::new();
    let mut all_package_candidates = Vec::new();
    for depot in depots {
        let candidates: Vec<PathBuf> = package_dirs(depot)
            .into_iter()
            .filter(|dir| !packages_to_keep.contains(dir))
            .collect();
        all_package_candidates.extend(candidates.iter().cloned());
        package_candidates_by_depot.insert(depot, candidates);
    }
    let (_, packages_to_delete_preliminary) = orphanage::merge(
        &path_strings(&all_package_candidates),
        &OrphanageRecord::default(),
        now,
        Duration::zero(),
    );
    let packages_to_delete_preliminary: BTreeSet<PathBuf> = packages_to_delete_preliminary
        .into_iter()
        .map(PathBuf::from)
        .collect();

    // Step 6: artifacts-to-keep, clones-to-keep, scratch-to-keep.
    let mut artifacts_to_keep: BTreeSet<PathBuf> = artifact_union.0.keys().map(PathBuf::from).collect();
    for depot in depots {
        let index_files = find_artifacts_index_files(depot);
        artifacts_to_keep.extend(
            reachability::mark(&index_files, artifact_mark(depot, &packages_to_delete_preliminary)).marked,
        );
    }

    let mut clones_to_keep = BTreeSet::new();
    for depot in depots {
        clones_to_keep.extend(reachability::mark(&manifest_index_files, repo_mark(depot)).marked);
    }

    let mut scratch_to_keep = BTreeSet::new();
    for (filename, entry) in &scratch_union.0 {
        if reachability::scratch_reachable(entry.parent_projects.as_ref(), &packages_to_delete_preliminary) {
            scratch_to_keep.insert(PathBuf::from(filename));
        }
    }

    // Step 7: enumerate on-disk inventory, compute per-depot orphan candidates for the
    // remaining three categories.
    let mut artifact_candidates_by_depot: BTreeMap<&Depot, Vec<PathBuf>> = BTreeMap::new();
    let mut clone_candidates_by_depot: BTreeMap<&Depot, Vec<PathBuf>> = BTreeMap::new();
    let mut scratch_candidates_by_depot: BTreeMap<&Depot, Vec<PathBuf>> = BTreeMap::new();

    for depot in depots {
        artifact_candidates_by_depot.insert(
            depot,
            list_dirs(&depot.artifacts_dir())
                .into_iter()
                .filter(|dir| !artifacts_to_keep.contains(dir))
                .collect(),
        );
        clone_candidates_by_depot.insert(
            depot,
            list_dirs(&depot.clones_dir())
                .into_iter()
                .filter(|dir| !clones_to_keep.contains(dir))
                .collect(),
        );
        scratch_candidates_by_depot.insert(
            depot,
            scratch_dirs(depot)
                .into_iter()
                .filter(|dir| !scratch_to_keep.contains(dir))
                .collect(),
        );
    }

    // Step 8: per depot, merge all four categories' candidates into that depot's orphanage.
    let mut deletions: Vec<(PathBuf, &'static str)> = Vec::new();
    for depot in depots {
        let mut candidates = Vec::new();
        candidates.extend(package_candidates_by_depot[depot].iter().cloned());
        candidates.extend(artifact_candidates_by_depot[depot].iter().cloned());
        candidates.extend(clone_candidates_by_depot[depot].iter().cloned());
        candidates.extend(scratch_candidates_by_depot[depot].iter().cloned());

        let old = OrphanageRecord::read(&depot.orphaned_log());
        let (new, deletion_list) = orphanage::merge(&path_strings(&candidates), &old, now, collect_delay);
        new.write(&depot.orphaned_log())?;

        for path in deletion_list {
            let path = PathBuf::from(path);
            let category = if package_candidates_by_depot[depot].contains(&path) {
                "packages"
            } else if artifact_candidates_by_depot[depot].contains(&path) {
                "artifacts"
            } else if clone_candidates_by_depot[depot].contains(&path) {
                "clones"
            } else {
                "scratchspaces"
            };
            deletions.push((path, category));
        }
    }

    // Step 9: delete, best-effort.
    let mut summary = GcSummary::default();
    for (path, category) in &deletions {
        let size = dir_size(path);
        match std::fs::remove_dir_all(path) {
            Ok(()) => {
                summary.freed_bytes += size;
                match *category {
                    "packages" => summary.packages_deleted += 1,
                    "artifacts" => summary.artifacts_deleted += 1,
                    "clones" => summary.clones_deleted += 1,
                    _ => summary.scratchspaces_deleted += 1,
                }
                progress.item(&format!("deleted {}", path.display()));
            }
            Err(err) => log::warn!("could not delete `{}` during gc: {err}", path.display()),
        }
    }

    // Step 10: prune now-empty containers.
    for depot in depots {
        prune_empty_children(&depot.packages_dir());
        prune_empty_children(&depot.scratchspaces_dir());
    }

    progress.done(&[
        ("packages", summary.packages_deleted as u64),
        ("artifacts", summary.artifacts_deleted as u64),
        ("clones", summary.clones_deleted as u64),
        ("scratchspaces", summary.scratchspaces_deleted as u64),
    ]);

    Ok(summary)
}

fn rewrite_filtered(
    depots: &[Depot],
    log_path: fn(&Depot) -> PathBuf,
    exists: impl Fn(&str) -> bool,
) -> Vec<(Depot, UsageLedger)> {
    depots
        .iter()
        .map(|depot| {
            let path = log_path(depot);
            let mut ledger = UsageLedger::read(&path);
            ledger.retain_existing(|filename| exists(filename));
            if let Err(err) = ledger.write(&path) {
                log::warn!("could not rewrite `{}` during gc: {err}", path.display());
            }
            (depot.clone(), ledger)
        })
        .collect()
}

fn rewrite_filtered_parents(depots: &[Depot]) -> Vec<(Depot, UsageLedger)> {
    depots
        .iter()
        .map(|depot| {
            let path = depot.scratch_usage_log();
            let mut ledger = UsageLedger::read(&path);
            ledger.retain_existing(|filename| Path::new(filename).exists());
            ledger.retain_existing_parents(|parent| Path::new(parent).is_file());
            if let Err(err) = ledger.write(&path) {
                log::warn!("could not rewrite `{}` during gc: {err}", path.display());
            }
            (depot.clone(), ledger)
        })
        .collect()
}

fn union(ledgers: &[(Depot, UsageLedger)]) -> UsageLedger {
    ledgers
        .iter()
        .fold(UsageLedger::default(), |acc, (_, ledger)| acc.merge_max(ledger.clone()))
}

fn path_strings(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.to_string_lossy().into_owned()).collect()
}

fn list_dirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect()
}

fn package_dirs(depot: &Depot) -> Vec<PathBuf> {
    list_dirs(&depot.packages_dir())
        .into_iter()
        .flat_map(|name_dir| list_dirs(&name_dir))
        .collect()
}

fn scratch_dirs(depot: &Depot) -> Vec<PathBuf> {
    list_dirs(&depot.scratchspaces_dir())
        .into_iter()
        .flat_map(|uuid_dir| list_dirs(&uuid_dir))
        .collect()
}

fn find_artifacts_index_files(depot: &Depot) -> Vec<PathBuf> {
    walkdir::WalkDir::new(depot.packages_dir())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name() == "Artifacts.toml")
        .map(|entry| entry.into_path())
        .collect()
}

fn dir_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

fn prune_empty_children(path: &Path) {
    for child in list_dirs(path) {
        for grandchild in list_dirs(&child) {
            let _ = std::fs::remove_dir(&grandchild);
        }
        let _ = std::fs::remove_dir(&child);
    }
}
