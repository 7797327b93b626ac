//! Shared test doubles for `depot-core`'s public-API integration tests. These exercise the crate
//! the way `depot-cli` does -- through `&dyn Trait` collaborators and the `Dispatcher` entry
//! points -- rather than reaching into private module internals.

use depot_core::collaborators::{CompileOutcome, SilentProgress};
use depot_core::options::{Preserve, TestOptions};
use depot_core::project::{Manifest, ManifestEntry, Project};
use depot_core::spec::PackageSpec;
use depot_core::{BuildRunner, Downloader, Error, GitProvider, ProjectManifestIo, Resolver, Result};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryIo {
    projects: RefCell<HashMap<PathBuf, Project>>,
    manifests: RefCell<HashMap<PathBuf, Manifest>>,
}

impl MemoryIo {
    pub fn seed_manifest(&self, path: &Path, manifest: Manifest) {
        self.manifests.borrow_mut().insert(path.to_path_buf(), manifest);
    }
}

impl ProjectManifestIo for MemoryIo {
    fn read_project(&self, path: &Path) -> Result<Project> {
        Ok(self.projects.borrow().get(path).cloned().unwrap_or_default())
    }
    fn write_project(&self, path: &Path, project: &Project) -> Result<()> {
        self.projects.borrow_mut().insert(path.to_path_buf(), project.clone());
        Ok(())
    }
    fn read_manifest(&self, path: &Path) -> Result<Manifest> {
        Ok(self.manifests.borrow().get(path).cloned().unwrap_or_default())
    }
    fn write_manifest(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        self.manifests.borrow_mut().insert(path.to_path_buf(), manifest.clone());
        Ok(())
    }
}

/// Assigns a stable, name-derived uuid to every spec and records it directly in the manifest,
/// standing in for the version-range solver.
pub struct StubResolver;

impl Resolver for StubResolver {
    fn resolve(
        &self,
        specs: &[PackageSpec],
        _project: &Project,
        manifest: &Manifest,
        _update_registry: bool,
        _preserve: Preserve,
        _platform: Option<&str>,
    ) -> Result<Manifest> {
        let mut manifest = manifest.clone();
        for spec in specs {
            let Some(name) = &spec.id.name else {
                return Err(Error::invalid_spec("a name is required by this resolver"));
            };
            let uuid = spec.id.uuid.unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()));
            let existing = manifest.get(&uuid).cloned().unwrap_or_default();
            manifest.insert(uuid, ManifestEntry { name: name.clone(), ..existing });
        }
        Ok(manifest)
    }
}

pub struct StubDownloader;

impl Downloader for StubDownloader {
    fn download_source(&self, _uuid: Uuid, _tree_hash: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }
    fn download_artifact(&self, _tree_hash: &str, _platform: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }
}

pub struct StubGit;

impl GitProvider for StubGit {
    fn clone_bare(&self, _source: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }
    fn fetch(&self, _mirror: &Path) -> Result<()> {
        Ok(())
    }
    fn checkout_tree_hash(&self, _mirror: &Path, _tree_hash: &str, _dest: &Path) -> Result<()> {
        Ok(())
    }
}

/// Never reports freshness (every package looks stale), never compiles for real; `fail` names
/// uuids whose `compile` call should fail instead.
#[derive(Default)]
pub struct StubBuildRunner {
    pub fail: BTreeSet<Uuid>,
}

impl BuildRunner for StubBuildRunner {
    fn is_fresh(&self, _uuid: Uuid, _cached_artifact_paths: &[PathBuf]) -> Result<bool> {
        Ok(false)
    }
    fn compile(&self, uuid: Uuid) -> Result<CompileOutcome> {
        if self.fail.contains(&uuid) {
            Err(Error::Other(anyhow::anyhow!("simulated build failure")))
        } else {
            Ok(CompileOutcome::Compiled)
        }
    }
    fn run_build_script(&self, _uuid: Uuid, _path: &Path) -> Result<()> {
        Ok(())
    }
    fn run_tests(&self, _uuid: Uuid, _path: &Path, _options: &TestOptions) -> Result<()> {
        Ok(())
    }
}

pub fn progress() -> SilentProgress {
    SilentProgress
}
