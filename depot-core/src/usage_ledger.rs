//! Usage Ledger (`spec.md §4.4`, §6): reads/writes per-depot last-use timestamps for manifests,
//! artifacts, and scratch spaces; condenses and merges across depots.

use depot_internal::atomic_write;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_projects: Option<BTreeSet<String>>,
}

/// The on-disk wire format: "top-level keys are filenames; values are single-element lists of
/// tables" (`spec.md §6`). Kept distinct from [`UsageLedger`] (the condensed in-memory form)
/// because a log written by a version that didn't condense on write could, in principle, still
/// have more than one entry per filename, and reading must tolerate that.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawUsageLog(BTreeMap<String, Vec<UsageEntry>>);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageLedger(pub BTreeMap<String, UsageEntry>);

impl UsageLedger {
    /// Any parse failure is treated as an empty ledger (`spec.md §7`: `ParseFailure` in GC is
    /// logged and treated as absent).
    #[must_use]
    pub fn read(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match toml::from_str::<RawUsageLog>(&text) {
            Ok(raw) => Self::condense(raw),
            Err(err) => {
                log::warn!("could not parse `{}`: {err}", path.display());
                Self::default()
            }
        }
    }

    fn condense(raw: RawUsageLog) -> Self {
        let mut out = BTreeMap::new();
        for (filename, entries) in raw.0 {
            let mut merged: Option<UsageEntry> = None;
            for entry in entries {
                merged = Some(match merged {
                    None => entry,
                    Some(existing) => merge_entries(existing, entry),
                });
            }
            if let Some(entry) = merged {
                out.insert(filename, entry);
            }
        }
        Self(out)
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let raw = RawUsageLog(
            self.0
                .iter()
                .map(|(filename, entry)| (filename.clone(), vec![entry.clone()]))
                .collect(),
        );
        let text = toml::to_string_pretty(&raw)?;
        atomic_write(path, &text)
    }

    /// Cross-depot union seeding reachability: takes the maximum timestamp per filename,
    /// unioning `parent_projects` where both sides have an entry.
    #[must_use]
    pub fn merge_max(mut self, other: Self) -> Self {
        for (filename, entry) in other.0 {
            self.0
                .entry(filename)
                .and_modify(|existing| {
                    let merged = merge_entries(existing.clone(), entry.clone());
                    *existing = merged;
                })
                .or_insert(entry);
        }
        self
    }

    pub fn touch(&mut self, filename: String, now: String, parent_project: Option<String>) {
        let entry = self.0.entry(filename).or_default();
        entry.time = now;
        if let Some(parent_project) = parent_project {
            entry
                .parent_projects
                .get_or_insert_with(BTreeSet::new)
                .insert(parent_project);
        }
    }

    /// GC step 3: drop entries whose filename no longer exists on disk.
    pub fn retain_existing(&mut self, mut exists: impl FnMut(&str) -> bool) {
        self.0.retain(|filename, _| exists(filename));
    }

    /// GC step 3 (scratch only): filter `parent_projects`, dropping the whole entry if the
    /// filtered set is empty.
    pub fn retain_existing_parents(&mut self, mut exists: impl FnMut(&str) -> bool) {
        self.0.retain(|_, entry| match &mut entry.parent_projects {
            Some(parents) => {
                parents.retain(|p| exists(p));
                !parents.is_empty()
            }
            None => true,
        });
    }

    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.0.contains_key(filename)
    }

    #[must_use]
    pub fn parents_of(&self, filename: &str) -> Option<&BTreeSet<String>> {
        self.0.get(filename).and_then(|e| e.parent_projects.as_ref())
    }
}

fn merge_entries(a: UsageEntry, b: UsageEntry) -> UsageEntry {
    let time = if b.time > a.time { b.time } else { a.time };
    let parent_projects = match (a.parent_projects, b.parent_projects) {
        (Some(mut x), Some(y)) => {
            x.extend(y);
            Some(x)
        }
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    };
    UsageEntry { time, parent_projects }
}
