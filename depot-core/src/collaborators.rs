//! Trait seams for the collaborators `spec.md §1` declares out of scope: the version-range
//! solver, the registry client, git plumbing, TOML reading/writing (of the user-facing project
//! and manifest files), the artifact downloader, the build runner, and progress rendering.
//!
//! The core never calls a concrete implementation of any of these; it is handed `&dyn Trait`
//! (or a generic bound) by the dispatcher's caller (`depot-cli` in production, a fake in tests).
//! This is what keeps the GC driver, the scheduler, and the dispatcher unit-testable without a
//! network, a registry, or a real compiler.

use crate::error::Result;
use crate::options::{Preserve, TestOptions};
use crate::project::{Manifest, Project};
use crate::spec::PackageSpec;
use std::path::Path;
use uuid::Uuid;

/// Reads and writes the user-facing project/manifest files. Kept separate from the engine's own
/// internal logs (usage ledger, orphanage, undo snapshots), which the engine serialises directly
/// with `toml` since their format is wholly internal (`spec.md §6`).
pub trait ProjectManifestIo {
    fn read_project(&self, path: &Path) -> Result<Project>;
    fn write_project(&self, path: &Path, project: &Project) -> Result<()>;
    fn read_manifest(&self, path: &Path) -> Result<Manifest>;
    fn write_manifest(&self, path: &Path, manifest: &Manifest) -> Result<()>;
}

/// Resolves a set of specs against a project/manifest, filling in version/tree-hash/deps.
/// Stands in for the version-range solver and registry client (`spec.md §1` Non-goals).
pub trait Resolver {
    /// `preserve` is the solver strictness for already-installed packages and `platform` the
    /// target platform for artifact selection -- both forwarded straight from `AddOptions`
    /// (`spec.md §6`) without interpretation by `depot_core` itself.
    fn resolve(
        &self,
        specs: &[PackageSpec],
        project: &Project,
        manifest: &Manifest,
        update_registry: bool,
        preserve: Preserve,
        platform: Option<&str>,
    ) -> Result<Manifest>;
}

/// Materialises package source trees and artifacts into a depot. Stands in for the artifact
/// downloader (`spec.md §1`).
pub trait Downloader {
    fn download_source(&self, uuid: Uuid, tree_hash: &str, dest: &Path) -> Result<()>;
    fn download_artifact(&self, tree_hash: &str, platform: &str, dest: &Path) -> Result<()>;
}

/// Clone/fetch/checkout for repo-tracked packages. The orchestration (when to clone, where to
/// put the mirror, which tree-hash to check out) lives in `depot_core`; only the git transport
/// itself is a collaborator.
pub trait GitProvider {
    fn clone_bare(&self, source: &str, dest: &Path) -> Result<()>;
    fn fetch(&self, mirror: &Path) -> Result<()>;
    fn checkout_tree_hash(&self, mirror: &Path, tree_hash: &str, dest: &Path) -> Result<()>;
}

/// Invokes the external compile routine (`spec.md §4.8` step 5) and answers staleness queries
/// (`spec.md §4.8` step 3). Stands in for the build runner (`spec.md §1`).
///
/// `Send + Sync` because the scheduler calls it from multiple worker threads concurrently.
pub trait BuildRunner: Send + Sync {
    /// `true` if any of `cached_artifact_paths` is usable without recompiling.
    fn is_fresh(&self, uuid: Uuid, cached_artifact_paths: &[std::path::PathBuf]) -> Result<bool>;

    /// Errors distinguish `PrecompileError` from `PrecompilableLater` via the `Result`'s error
    /// variant (`crate::error::Error::PrecompileError` vs. a successful `Ok(CompileOutcome::PrecompilableLater)`).
    fn compile(&self, uuid: Uuid) -> Result<CompileOutcome>;

    /// Runs a package's build script during `instantiate` (`spec.md §4.9`).
    fn run_build_script(&self, uuid: Uuid, path: &Path) -> Result<()>;

    /// Runs a package's test suite (the `test` dispatcher entry point, `spec.md §4.9`/§6).
    /// `options` carries `coverage`/`julia_args`-equivalent/`test_args`, forwarded verbatim.
    fn run_tests(&self, uuid: Uuid, path: &Path, options: &TestOptions) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled,
    /// "Not cacheable in this session" -- a warning, not an error (`spec.md §7`).
    PrecompilableLater,
}

/// Per-item progress narration (`verbose` option, `spec.md §6`). A no-op implementation is
/// always a valid choice.
pub trait ProgressSink: Send + Sync {
    fn item(&self, message: &str);
    fn done(&self, freed_bytes_by_category: &[(&str, u64)]);
}

pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn item(&self, _message: &str) {}
    fn done(&self, _freed_bytes_by_category: &[(&str, u64)]) {}
}
