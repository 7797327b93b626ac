//! Depot layout (`spec.md §3`, §6): a filesystem root containing four content-addressed trees
//! plus a `logs/` tree.

use depot_internal::hashing;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Depot {
    pub root: PathBuf,
}

impl Depot {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    #[must_use]
    pub fn package_dir(&self, name: &str, tree_hash: &str) -> PathBuf {
        self.packages_dir().join(name).join(hashing::package_slug(tree_hash))
    }

    #[must_use]
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join("artifacts")
    }

    #[must_use]
    pub fn artifact_dir(&self, tree_hash: &str) -> PathBuf {
        self.artifacts_dir().join(tree_hash)
    }

    #[must_use]
    pub fn clones_dir(&self) -> PathBuf {
        self.root.join("clones")
    }

    #[must_use]
    pub fn clone_dir(&self, source: &str) -> PathBuf {
        self.clones_dir().join(hashing::clone_cache_key(source))
    }

    #[must_use]
    pub fn scratchspaces_dir(&self) -> PathBuf {
        self.root.join("scratchspaces")
    }

    #[must_use]
    pub fn scratchspace_dir(&self, uuid: uuid::Uuid, name: &str) -> PathBuf {
        self.scratchspaces_dir().join(uuid.to_string()).join(name)
    }

    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    #[must_use]
    pub fn manifest_usage_log(&self) -> PathBuf {
        self.logs_dir().join("manifest_usage.toml")
    }

    #[must_use]
    pub fn artifact_usage_log(&self) -> PathBuf {
        self.logs_dir().join("artifact_usage.toml")
    }

    #[must_use]
    pub fn scratch_usage_log(&self) -> PathBuf {
        self.logs_dir().join("scratch_usage.toml")
    }

    #[must_use]
    pub fn orphaned_log(&self) -> PathBuf {
        self.logs_dir().join("orphaned.toml")
    }

    /// Scratch file for packages suspended from precompilation, keyed by (project path,
    /// toolchain version) inside the file itself (`spec.md §4.8`, §9).
    #[must_use]
    pub fn suspended_log(&self) -> PathBuf {
        self.logs_dir().join("suspended.toml")
    }
}
