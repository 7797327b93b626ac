//! Project-local configuration (`depot.toml`), read the way `dylint_internal::config` reads
//! `dylint.toml`: a `OnceLock<toml::Table>`, populated once per process, providing defaults that
//! environment variables can still override at the call site.

use std::path::Path;
use std::sync::OnceLock;

static CONFIG_TABLE: OnceLock<toml::value::Table> = OnceLock::new();

/// Reads `<project_dir>/depot.toml` on first call; subsequent calls return the cached table
/// regardless of `project_dir` (mirrors the teacher's one-table-per-process assumption).
pub fn get(project_dir: &Path) -> &'static toml::value::Table {
    CONFIG_TABLE.get_or_init(|| {
        let path = project_dir.join("depot.toml");
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return toml::value::Table::new();
        };
        match toml::from_str(&contents) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("could not parse `{}`: {err}", path.display());
                toml::value::Table::new()
            }
        }
    })
}

#[must_use]
pub fn collect_delay_days(table: &toml::value::Table, default: i64) -> i64 {
    table
        .get("collect_delay_days")
        .and_then(toml::Value::as_integer)
        .unwrap_or(default)
}

#[must_use]
pub fn precompile_auto(table: &toml::value::Table, default: bool) -> bool {
    table
        .get("precompile_auto")
        .and_then(toml::Value::as_bool)
        .unwrap_or(default)
}

#[must_use]
pub fn num_precompile_tasks(table: &toml::value::Table, default: usize) -> usize {
    table
        .get("num_precompile_tasks")
        .and_then(toml::Value::as_integer)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}
