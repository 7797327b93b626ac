use crate::env;
use std::path::PathBuf;

/// Resolves the depot home directory: `$DEPOT_HOME` if set, else `$HOME/.depot`.
///
/// Grounded in `dylint_internal::home::cargo_home` and
/// `driver_builder::dylint_drivers`'s `$DYLINT_DRIVER_PATH`-or-`$HOME`-fallback logic.
pub fn depot_home() -> anyhow::Result<PathBuf> {
    if let Ok(path) = env::var(env::DEPOT_HOME) {
        return Ok(PathBuf::from(path));
    }
    let home = env::var(env::HOME)?;
    Ok(PathBuf::from(home).join(".depot"))
}
