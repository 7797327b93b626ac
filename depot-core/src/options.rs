//! Per-operation option types (`spec.md §6`). One struct per dispatcher entry point rather than
//! one god-struct, so each operation only accepts options it actually interprets.

use chrono::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preserve {
    #[default]
    Tiered,
    All,
    Direct,
    Semver,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level {
    #[default]
    Fixed,
    Patch,
    Minor,
    Major,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Project,
    Manifest,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddOptions {
    pub preserve: Preserve,
    pub platform: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpOptions {
    pub level: Level,
    pub mode: Mode,
    pub update_registry: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RmOptions {
    pub mode: Mode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeOptions {
    pub mode: Mode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusOptions {
    pub mode: Mode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcOptions {
    pub collect_delay: Duration,
    pub verbose: bool,
}

impl Default for GcOptions {
    fn default() -> Self {
        Self {
            collect_delay: Duration::days(7),
            verbose: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstantiateOptions {
    pub platform: Option<String>,
    pub update_registry: bool,
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrecompileOptions {
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivateOptions {
    pub shared: bool,
    pub temp: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestOptions {
    pub coverage: bool,
    pub extra_args: Vec<String>,
    pub test_args: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gc_default_collect_delay_is_seven_days() {
        assert_eq!(GcOptions::default().collect_delay, Duration::days(7));
    }
}
