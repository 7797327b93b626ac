//! Spec Validator (`spec.md §4.1`): normalises and rejects malformed package specifications
//! before anything downstream sees them.

use crate::error::{Error, Result};
use semver::Version;
use std::collections::BTreeSet;
use uuid::Uuid;

/// A package manager may reserve a handful of names for itself (the way many registries forbid
/// a package sharing the name of a bootstrap/standard module). `spec.md §4.1` hardcodes exactly
/// one such name; this generalises it to a caller-supplied set so the rule isn't baked into the
/// validator as a magic string.
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["core"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageId {
    pub name: Option<String>,
    pub uuid: Option<Uuid>,
}

impl PackageId {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.uuid.is_none()
    }
}

/// How a package's source is tracked. Validator rules are exhaustive pattern matches over this,
/// per `spec.md §9`'s "Design Notes".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tracking {
    Registry,
    Path(std::path::PathBuf),
    Repo {
        source: String,
        revision: Option<String>,
        subdir: Option<String>,
    },
}

impl Default for Tracking {
    fn default() -> Self {
        Self::Registry
    }
}

/// Just enough of a version constraint for the validator to inspect (`pin` needs to know
/// whether a range is degenerate). The actual solver is an external collaborator
/// (`spec.md §1`, Non-goals).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionSpec {
    Exact(Version),
    Range { lower: Version, upper: Version },
}

impl VersionSpec {
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Exact(_) => true,
            Self::Range { lower, upper } => lower == upper,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Project,
    Manifest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageSpec {
    pub id: PackageId,
    pub version: Option<VersionSpec>,
    pub tree_hash: Option<String>,
    pub pinned: bool,
    pub mode: Mode,
    pub tracking: Tracking,
}

impl PackageSpec {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            id: PackageId {
                name: Some(name.to_owned()),
                uuid: None,
            },
            version: None,
            tree_hash: None,
            pinned: false,
            mode: Mode::Project,
            tracking: Tracking::Registry,
        }
    }

    fn has_only_id_fields(&self) -> bool {
        self.version.is_none()
            && self.tree_hash.is_none()
            && !self.pinned
            && matches!(self.tracking, Tracking::Registry)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Develop,
    Rm,
    Free,
    Pin,
    /// `up`, `resolve`, `test`, `build`, `status`, `instantiate`: the spec defines no
    /// per-operation validation rules for these beyond "specs must eventually resolve"
    /// (`EnvironmentCache::ensure_resolved`, `spec.md §4.2`).
    Unconstrained,
}

/// Validates and deep-copies `specs` for `op`, per the rules in `spec.md §4.1`.
///
/// `project_self_name`, when given, is rejected as a dependency name (a project cannot depend on
/// itself). `reserved_names` defaults to [`DEFAULT_RESERVED_NAMES`] when empty.
pub fn validate(
    op: Operation,
    specs: &[PackageSpec],
    project_self_name: Option<&str>,
    reserved_names: &[&str],
) -> Result<Vec<PackageSpec>> {
    let reserved: &[&str] = if reserved_names.is_empty() {
        DEFAULT_RESERVED_NAMES
    } else {
        reserved_names
    };

    let copies: Vec<PackageSpec> = specs.to_vec();

    match op {
        Operation::Add | Operation::Develop => validate_add_like(op, &copies, project_self_name, reserved)?,
        Operation::Rm | Operation::Free => validate_rm_like(&copies)?,
        Operation::Pin => validate_pin(&copies)?,
        Operation::Unconstrained => {}
    }

    Ok(copies)
}

fn validate_add_like(
    op: Operation,
    specs: &[PackageSpec],
    project_self_name: Option<&str>,
    reserved: &[&str],
) -> Result<()> {
    let mut seen_names = BTreeSet::new();
    let mut seen_uuids = BTreeSet::new();

    for spec in specs {
        if let Some(name) = &spec.id.name {
            if reserved.contains(&name.as_str()) {
                return Err(Error::invalid_spec(format!(
                    "`{name}` is not a valid package name"
                )));
            }
            if Some(name.as_str()) == project_self_name {
                return Err(Error::invalid_spec(format!(
                    "package `{name}` cannot depend on itself"
                )));
            }
            if !seen_names.insert(name.clone()) {
                return Err(Error::invalid_spec(format!(
                    "`{name}` was specified more than once"
                )));
            }
        }

        if let Some(uuid) = spec.id.uuid {
            if !seen_uuids.insert(uuid) {
                return Err(Error::invalid_spec(format!(
                    "`{uuid}` was specified more than once"
                )));
            }
        }

        let has_repo_source = matches!(&spec.tracking, Tracking::Repo { .. });

        if spec.id.is_empty() && !has_repo_source {
            return Err(Error::invalid_spec(
                "a package specification requires a name, a uuid, or a repository source",
            ));
        }

        if has_repo_source && spec.version.is_some() {
            return Err(Error::invalid_spec(
                "a git-tracked package cannot have an explicit version",
            ));
        }

        if op == Operation::Develop {
            if let Tracking::Repo {
                revision: Some(_), ..
            } = &spec.tracking
            {
                return Err(Error::invalid_spec(
                    "rev argument not supported by develop",
                ));
            }
        }
    }

    Ok(())
}

fn validate_rm_like(specs: &[PackageSpec]) -> Result<()> {
    for spec in specs {
        if spec.id.is_empty() {
            return Err(Error::invalid_spec(
                "packages may only be specified by name or UUID",
            ));
        }
        if !spec.has_only_id_fields() {
            return Err(Error::invalid_spec(
                "packages may only be specified by name or UUID",
            ));
        }
    }
    Ok(())
}

fn validate_pin(specs: &[PackageSpec]) -> Result<()> {
    for spec in specs {
        if matches!(spec.tracking, Tracking::Repo { .. }) {
            return Err(Error::invalid_spec(
                "repository fields cannot be used with pin",
            ));
        }
        if let Some(version) = &spec.version {
            if !version.is_degenerate() {
                return Err(Error::invalid_spec(
                    "pin requires an exact version, not a range",
                ));
            }
        }
    }
    Ok(())
}
