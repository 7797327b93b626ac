//! Environment variable names recognised by the depot engine (`spec.md §6`).

use anyhow::{anyhow, Result};

macro_rules! declare_const {
    ($var:ident) => {
        pub const $var: &str = stringify!($var);
    };
}

declare_const!(DEPOT_HOME);
declare_const!(DEPOT_NUM_PRECOMPILE_TASKS);
declare_const!(DEPOT_PKG_PRECOMPILE_AUTO);
declare_const!(HOME);

/// Returns `true` if `key` is set to a value other than `"0"`.
#[must_use]
pub fn enabled_default(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => value != "0",
        Err(_) => default,
    }
}

/// A wrapper around `std::env::var` that converts the error into an `anyhow::Error`.
pub fn var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|err| anyhow!("{err}: {key}"))
}

/// Parses an integer environment variable, falling back to `default` when unset, and failing
/// (rather than silently substituting the default) when the variable is set but unparsable.
pub fn parse_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|err| anyhow!("`{key}` is not a valid non-negative integer: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn enabled_default_respects_default_when_unset() {
        assert!(enabled_default("DEPOT_TEST_VAR_NOT_SET", true));
        assert!(!enabled_default("DEPOT_TEST_VAR_NOT_SET", false));
    }

    #[test]
    fn parse_usize_rejects_garbage() {
        // SAFETY: test-local var, not read concurrently elsewhere in this process.
        unsafe {
            std::env::set_var("DEPOT_TEST_NUM", "not-a-number");
        }
        assert!(parse_usize("DEPOT_TEST_NUM", 4).is_err());
        unsafe {
            std::env::remove_var("DEPOT_TEST_NUM");
        }
        assert_eq!(parse_usize("DEPOT_TEST_NUM", 4).unwrap(), 4);
    }
}
