//! Orphanage (`spec.md §4.6`): per-depot persistent grace-period state for unreachable content.

use depot_internal::atomic_write;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrphanageRecord(pub BTreeMap<String, String>);

impl OrphanageRecord {
    /// A `ParseFailure` here is treated as an empty record (`spec.md §7`).
    #[must_use]
    pub fn read(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&text) {
            Ok(map) => Self(map),
            Err(err) => {
                log::warn!("could not parse `{}`: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Written atomically even if empty, so a stale file is truncated rather than left behind
    /// (`spec.md §4.6`).
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(&self.0)?;
        atomic_write(path, &text)
    }
}

/// `merge(new, candidates, deletion_list, old)` (`spec.md §4.6`): for each candidate path, the
/// free time is `old[path]` if present, else `now`. `new[path]` always gets set; `path` is
/// appended to `deletion_list` once it has been continuously unreachable for `collect_delay`.
///
/// A path reachable again between runs is simply absent from the next `candidates` call and so
/// drops out of `new` on its own -- no special-cased "reinstatement" branch is needed.
pub fn merge(
    candidates: &[String],
    old: &OrphanageRecord,
    now: chrono::DateTime<chrono::Utc>,
    collect_delay: chrono::Duration,
) -> (OrphanageRecord, Vec<String>) {
    let mut new = BTreeMap::new();
    let mut deletion_list = Vec::new();

    for path in candidates {
        let free_time = match old.0.get(path) {
            Some(recorded) => recorded.clone(),
            None => now.to_rfc3339(),
        };

        let free_time_parsed = chrono::DateTime::parse_from_rfc3339(&free_time)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or(now);

        if now - free_time_parsed >= collect_delay {
            deletion_list.push(path.clone());
        }

        new.insert(path.clone(), free_time);
    }

    (OrphanageRecord(new), deletion_list)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn freshly_orphaned_path_is_recorded_but_not_deleted() {
        let old = OrphanageRecord::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (new, deletion_list) = merge(
            &["packages/Foo/abc".to_owned()],
            &old,
            now,
            Duration::days(7),
        );
        assert!(deletion_list.is_empty());
        assert_eq!(new.0["packages/Foo/abc"], now.to_rfc3339());
    }

    #[test]
    fn path_unreachable_past_grace_period_is_deleted() {
        let first_seen = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut old = OrphanageRecord::default();
        old.0.insert("packages/Foo/abc".to_owned(), first_seen.to_rfc3339());

        let later = first_seen + Duration::days(8);
        let (new, deletion_list) = merge(
            &["packages/Foo/abc".to_owned()],
            &old,
            later,
            Duration::days(7),
        );
        assert_eq!(deletion_list, vec!["packages/Foo/abc".to_owned()]);
        assert_eq!(new.0["packages/Foo/abc"], first_seen.to_rfc3339());
    }

    #[test]
    fn path_exactly_at_grace_period_boundary_is_deleted() {
        let first_seen = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut old = OrphanageRecord::default();
        old.0.insert("p".to_owned(), first_seen.to_rfc3339());

        let exactly = first_seen + Duration::days(7);
        let (_, deletion_list) = merge(&["p".to_owned()], &old, exactly, Duration::days(7));
        assert_eq!(deletion_list, vec!["p".to_owned()]);
    }

    #[test]
    fn reinstated_path_is_absent_from_new_record() {
        let first_seen = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut old = OrphanageRecord::default();
        old.0.insert("packages/Foo/abc".to_owned(), first_seen.to_rfc3339());

        // "packages/Foo/abc" became reachable again, so it is not among this run's candidates.
        let (new, deletion_list) = merge(&[], &old, first_seen + Duration::days(30), Duration::days(7));
        assert!(new.0.is_empty());
        assert!(deletion_list.is_empty());
    }

    #[test]
    fn round_trip_preserves_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphaned.toml");
        let mut record = OrphanageRecord::default();
        record.0.insert("packages/Foo/abc".to_owned(), "2026-01-01T00:00:00+00:00".to_owned());
        record.write(&path).unwrap();
        assert_eq!(OrphanageRecord::read(&path), record);
    }

    #[test]
    fn write_truncates_stale_file_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orphaned.toml");
        std::fs::write(&path, "\"stale\" = \"2020-01-01T00:00:00+00:00\"\n").unwrap();
        OrphanageRecord::default().write(&path).unwrap();
        assert_eq!(OrphanageRecord::read(&path), OrphanageRecord::default());
    }
}
