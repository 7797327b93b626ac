//! Minimal stand-ins for the collaborators `spec.md §1` keeps out of scope: the version-range
//! solver, the registry client, the artifact downloader, and the build runner. None of these
//! exist in production form here -- `depot-core`'s engine (validator, environment cache, GC
//! driver, precompile scheduler, dispatcher) is what this exercise is about, and it never
//! touches these concrete types, only the trait objects in `depot_core::collaborators`.
//!
//! `FsResolver` and `FsDownloader` work against a local directory tree rather than a real
//! registry protocol, which is enough to make `depot` runnable end-to-end without claiming to
//! implement a registry sync protocol.

use depot_core::collaborators::CompileOutcome;
use depot_core::error::{Error, Result};
use depot_core::options::{Preserve, TestOptions};
use depot_core::project::{Manifest, ManifestEntry, Project};
use depot_core::spec::PackageSpec;
use depot_core::{BuildRunner, Downloader};
use std::path::Path;
use uuid::Uuid;

/// Resolves specs against whatever version/tree-hash the caller already supplied, assigning a
/// fresh uuid to brand-new names. No range solving: `spec.md §1` keeps that external.
pub struct IdentityResolver;

impl depot_core::Resolver for IdentityResolver {
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
                return Err(Error::invalid_spec("a package name is required without a registry resolver"));
            };
            let uuid = spec
                .id
                .uuid
                .or_else(|| manifest.find_by_name(name).map(|(uuid, _)| uuid))
                .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()));
            let existing = manifest.get(&uuid).cloned().unwrap_or_default();
            manifest.insert(
                uuid,
                ManifestEntry {
                    name: name.clone(),
                    tree_hash: spec.tree_hash.clone().or(existing.tree_hash),
                    pinned: spec.pinned,
                    ..existing
                },
            );
        }
        Ok(manifest)
    }
}

/// Copies package source/artifact trees from a local directory instead of fetching them from a
/// network registry.
pub struct FsDownloader {
    pub source_root: std::path::PathBuf,
}

impl Downloader for FsDownloader {
    fn download_source(&self, _uuid: Uuid, tree_hash: &str, dest: &Path) -> Result<()> {
        let src = self.source_root.join(tree_hash);
        copy_dir(&src, dest)
    }

    fn download_artifact(&self, tree_hash: &str, platform: &str, dest: &Path) -> Result<()> {
        let src = self.source_root.join(tree_hash).join(platform);
        copy_dir(&src, dest)
    }
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::NotFound(src.display().to_string()));
    }
    std::fs::create_dir_all(dest).map_err(|source| Error::IoFailure { path: dest.to_path_buf(), source })?;
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(|err| Error::Other(anyhow::anyhow!("{err}")))?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|source| Error::IoFailure { path: target.clone(), source })?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|source| Error::IoFailure { path: target.clone(), source })?;
        }
    }
    Ok(())
}

/// Runs a package's `build.rs`-equivalent (a `build` script file at the package root, if
/// present) via `std::process::Command`, following `dylint_internal::CommandExt`'s
/// logged-output pattern. Compilation itself (`spec.md §4.8`) is treated as always fresh: there
/// is no compiler driver here, only the scheduling around one.
pub struct ProcessBuildRunner;

impl BuildRunner for ProcessBuildRunner {
    fn is_fresh(&self, _uuid: Uuid, cached_artifact_paths: &[std::path::PathBuf]) -> Result<bool> {
        Ok(cached_artifact_paths.iter().any(|path| path.exists()))
    }

    fn compile(&self, _uuid: Uuid) -> Result<CompileOutcome> {
        Ok(CompileOutcome::Compiled)
    }

    fn run_build_script(&self, uuid: Uuid, path: &Path) -> Result<()> {
        let script = path.join("build");
        if !script.exists() {
            return Ok(());
        }
        use depot_internal::CommandExt;
        let _ = uuid;
        std::process::Command::new(&script)
            .current_dir(path)
            .success()
            .map_err(Error::Other)
    }

    fn run_tests(&self, uuid: Uuid, path: &Path, options: &TestOptions) -> Result<()> {
        let script = path.join("test");
        if !script.exists() {
            return Ok(());
        }
        use depot_internal::CommandExt;
        let _ = uuid;
        let mut command = std::process::Command::new(&script);
        command.current_dir(path).args(&options.extra_args).args(&options.test_args);
        if options.coverage {
            command.env("DEPOT_TEST_COVERAGE", "1");
        }
        command.success().map_err(Error::Other)
    }
}
