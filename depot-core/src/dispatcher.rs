//! Operation Dispatcher (`spec.md §4.9`): validate -> deep-copy -> optionally refresh registries
//! -> resolve specs -> mutate -> write -> undo snapshot -> optionally auto-precompile. Every
//! mutating operation (add/develop/rm/up/pin/free) follows this one skeleton; `resolve` is `up`
//! with `level=fixed`, `mode=manifest`, no registry refresh (`spec.md §4.9`).

use crate::collaborators::{BuildRunner, Downloader, GitProvider, ProgressSink, ProjectManifestIo, Resolver};
use crate::depot::Depot;
use crate::env_cache::EnvironmentCache;
use crate::error::{Error, Result};
use crate::gc::{self, GcSummary};
use crate::options::{
    AddOptions, FreeOptions, GcOptions, InstantiateOptions, Level, Mode, PrecompileOptions, RmOptions, StatusOptions,
    TestOptions, UpOptions,
};
use crate::precompile::{Latch, PrecompileReport, Scheduler, SuspendedList};
use crate::project::{Manifest, Project};
use crate::runtime::Runtime;
use crate::spec::{self, validate, Operation, PackageSpec, Tracking};
use crate::undo::UndoSnapshot;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Result of [`Dispatcher::status`]: the loaded cache plus the subset of uuids `options.mode`
/// says should be reported (`spec.md §6`).
pub struct StatusReport {
    pub cache: EnvironmentCache,
    pub displayed: BTreeSet<Uuid>,
}

pub struct Dispatcher<'a> {
    pub io: &'a dyn ProjectManifestIo,
    pub resolver: &'a dyn Resolver,
    pub downloader: &'a dyn Downloader,
    pub git: &'a dyn GitProvider,
    pub build_runner: &'a dyn BuildRunner,
    pub progress: &'a dyn ProgressSink,
    pub reserved_names: Vec<String>,
    pub precompile_auto: bool,
    pub precompile_tasks: usize,
    /// Scratch file the persistent suspended-package list is read from and written back to
    /// around every `precompile` run (`spec.md §4.8`, §9).
    pub suspended_file: PathBuf,
}

impl<'a> Dispatcher<'a> {
    fn reserved_names(&self) -> Vec<&str> {
        self.reserved_names.iter().map(String::as_str).collect()
    }

    /// The shared skeleton every mutating operation runs through. `Add`/`Develop`/`Unconstrained`
    /// (`up`) delegate the actual version/uuid decision to the [`Resolver`] collaborator; `Rm`,
    /// `Free`, `Pin` are local, deterministic edits against already-resolved manifest entries and
    /// never need a solver.
    #[allow(clippy::too_many_arguments)]
    fn mutate(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        op: Operation,
        specs: &[PackageSpec],
        update_registry: bool,
        mode: Mode,
        preserve: crate::options::Preserve,
        platform: Option<&str>,
        now: &str,
    ) -> Result<EnvironmentCache> {
        let mut cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;
        let reserved = self.reserved_names();
        let validated = validate(op, specs, cache.project.name.as_deref(), &reserved)?;

        match op {
            Operation::Add | Operation::Develop | Operation::Unconstrained => {
                let resolved_manifest = self.resolver.resolve(
                    &validated,
                    &cache.project,
                    &cache.manifest,
                    update_registry,
                    preserve,
                    platform,
                )?;
                cache.manifest = resolved_manifest;

                for spec in &validated {
                    let Some(name) = &spec.id.name else { continue };
                    let Some((uuid, _)) = cache.manifest.find_by_name(name) else { continue };
                    cache.project.deps.insert(name.clone(), uuid);
                    if op == Operation::Develop {
                        if let Tracking::Path(path) = &spec.tracking {
                            if let Some(entry) = cache.manifest.0.get_mut(&uuid) {
                                entry.path = Some(path.clone());
                            }
                        }
                    }
                }
            }
            Operation::Rm => {
                let resolved = self.resolve_by_mode(&cache, &validated, mode)?;
                EnvironmentCache::ensure_resolved(&resolved)?;
                for spec in &resolved {
                    if let Some(name) = &spec.id.name {
                        cache.project.deps.remove(name);
                    }
                    if let Some(uuid) = spec.id.uuid {
                        cache.manifest.remove(&uuid);
                    }
                }
            }
            Operation::Free => {
                let resolved = self.resolve_by_mode(&cache, &validated, mode)?;
                EnvironmentCache::ensure_resolved(&resolved)?;
                for spec in &resolved {
                    if let Some(uuid) = spec.id.uuid {
                        if let Some(entry) = cache.manifest.0.get_mut(&uuid) {
                            entry.pinned = false;
                        }
                    }
                }
            }
            Operation::Pin => {
                let resolved = cache.resolve_manifest(&validated)?;
                EnvironmentCache::ensure_resolved(&resolved)?;
                for spec in &resolved {
                    if let Some(uuid) = spec.id.uuid {
                        if let Some(entry) = cache.manifest.0.get_mut(&uuid) {
                            entry.pinned = true;
                        }
                    }
                }
            }
        }

        cache.write(self.io)?;
        runtime.undo_log.snapshot(&cache, now);

        if self.precompile_auto {
            let _ = self.precompile(runtime, project_file, manifest_file, None, false, PrecompileOptions::default());
        }

        Ok(cache)
    }

    /// `rm`/`free` scope resolution by `mode` ("Scope of operation", `spec.md §6`): `Project`
    /// resolves against direct project deps, `Manifest` against the full manifest.
    fn resolve_by_mode(&self, cache: &EnvironmentCache, specs: &[PackageSpec], mode: Mode) -> Result<Vec<PackageSpec>> {
        match mode {
            Mode::Project => cache.resolve_project_deps(specs),
            Mode::Manifest => cache.resolve_manifest(specs),
        }
    }

    pub fn add(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        specs: &[PackageSpec],
        options: &AddOptions,
        now: &str,
    ) -> Result<EnvironmentCache> {
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Add,
            specs,
            false,
            Mode::Project,
            options.preserve,
            options.platform.as_deref(),
            now,
        )
    }

    pub fn develop(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        specs: &[PackageSpec],
        options: &AddOptions,
        now: &str,
    ) -> Result<EnvironmentCache> {
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Develop,
            specs,
            false,
            Mode::Project,
            options.preserve,
            options.platform.as_deref(),
            now,
        )
    }

    pub fn rm(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        specs: &[PackageSpec],
        options: &RmOptions,
        now: &str,
    ) -> Result<EnvironmentCache> {
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Rm,
            specs,
            false,
            options.mode,
            crate::options::Preserve::default(),
            None,
            now,
        )
    }

    pub fn pin(&self, runtime: &mut Runtime, project_file: &Path, manifest_file: &Path, specs: &[PackageSpec], now: &str) -> Result<EnvironmentCache> {
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Pin,
            specs,
            false,
            Mode::Manifest,
            crate::options::Preserve::default(),
            None,
            now,
        )
    }

    pub fn free(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        specs: &[PackageSpec],
        options: &FreeOptions,
        now: &str,
    ) -> Result<EnvironmentCache> {
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Free,
            specs,
            false,
            options.mode,
            crate::options::Preserve::default(),
            None,
            now,
        )
    }

    pub fn up(&self, runtime: &mut Runtime, project_file: &Path, manifest_file: &Path, specs: &[PackageSpec], options: &UpOptions, now: &str) -> Result<EnvironmentCache> {
        let _ = options.level;
        self.mutate(
            runtime,
            project_file,
            manifest_file,
            Operation::Unconstrained,
            specs,
            options.update_registry,
            options.mode,
            crate::options::Preserve::default(),
            None,
            now,
        )
    }

    /// `resolve` is `up` with `level=fixed`, manifest mode, no registry refresh (`spec.md §4.9`).
    pub fn resolve(&self, runtime: &mut Runtime, project_file: &Path, manifest_file: &Path, now: &str) -> Result<EnvironmentCache> {
        let options = UpOptions {
            level: Level::Fixed,
            mode: Mode::Manifest,
            update_registry: false,
        };
        self.up(runtime, project_file, manifest_file, &[], &options, now)
    }

    /// `options.mode` picks which packages `displayed` names ("Scope of operation", `spec.md
    /// §6`): `Project` reports only direct project deps, `Manifest` every resolved entry.
    pub fn status(&self, project_file: &Path, manifest_file: &Path, options: &StatusOptions) -> Result<StatusReport> {
        let cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;
        let displayed: BTreeSet<Uuid> = match options.mode {
            Mode::Project => cache.project.deps.values().copied().collect(),
            Mode::Manifest => cache.manifest.0.keys().copied().collect(),
        };
        Ok(StatusReport { cache, displayed })
    }

    pub fn undo(&self, runtime: &mut Runtime, project_file: &Path) -> Option<UndoSnapshot> {
        runtime.undo_log.undo(&project_file.to_path_buf())
    }

    pub fn redo(&self, runtime: &mut Runtime, project_file: &Path) -> Option<UndoSnapshot> {
        runtime.undo_log.redo(&project_file.to_path_buf())
    }

    /// Materialises an undo/redo snapshot back to disk without re-recording it as a new
    /// snapshot (`spec.md §4.3`: "writes it with snapshotting disabled to avoid self-insertion").
    pub fn apply_snapshot(&self, project_file: &Path, manifest_file: &Path, snapshot: &UndoSnapshot) -> Result<()> {
        self.io.write_project(project_file, &snapshot.project)?;
        self.io.write_manifest(manifest_file, &snapshot.manifest)?;
        Ok(())
    }

    pub fn gc(&self, depots: &[Depot], options: &GcOptions, now: chrono::DateTime<chrono::Utc>) -> Result<GcSummary> {
        gc::run(depots, options.collect_delay, now, self.progress).map_err(Error::Other)
    }

    /// `depot` supplies the cached-artefact paths the staleness check (`spec.md §4.8` step 3)
    /// consults; `None` (the auto-precompile-from-`mutate` case, which has no depot in scope)
    /// degrades to treating every package as stale rather than skipping the check. `manual` is
    /// `true` only for an explicit, user-invoked precompile (`spec.md §9`): it clears every
    /// suspension recorded for this (project, toolchain) pair before scheduling.
    pub fn precompile(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        depot: Option<&Depot>,
        manual: bool,
        options: PrecompileOptions,
    ) -> Result<PrecompileReport> {
        let _ = options.verbose;
        let cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;

        let graph: BTreeMap<Uuid, Vec<Uuid>> = cache
            .manifest
            .0
            .iter()
            .map(|(uuid, entry)| (*uuid, entry.deps.values().copied().collect()))
            .collect();
        let names: BTreeMap<Uuid, String> =
            cache.manifest.0.iter().map(|(uuid, entry)| (*uuid, entry.name.clone())).collect();
        let direct: BTreeSet<Uuid> = cache.project.deps.values().copied().collect();
        let candidate_paths: BTreeMap<Uuid, Vec<PathBuf>> = match depot {
            Some(depot) => cache
                .manifest
                .0
                .iter()
                .filter_map(|(uuid, entry)| {
                    let tree_hash = entry.tree_hash.as_ref()?;
                    Some((*uuid, vec![depot.package_dir(&entry.name, tree_hash), depot.artifact_dir(tree_hash)]))
                })
                .collect(),
            None => BTreeMap::new(),
        };

        let project_key = project_file.to_string_lossy().into_owned();
        runtime.suspended = SuspendedList::read(&self.suspended_file);
        if manual {
            runtime.suspended.clear_all(&project_key, &runtime.toolchain_version);
        }

        let scheduler = Scheduler::new(&graph, &names, &candidate_paths, self.build_runner, self.progress);
        let cancel = Latch::new();
        let report = scheduler.run(
            &direct,
            &mut runtime.suspended,
            &project_key,
            &runtime.toolchain_version,
            self.precompile_tasks,
            &cancel,
        );

        if let Err(err) = runtime.suspended.write(&self.suspended_file) {
            log::warn!("could not persist suspended-package list to `{}`: {err}", self.suspended_file.display());
        }

        if !report.failed.is_empty() {
            let direct_failures: Vec<String> = report
                .failed
                .keys()
                .filter(|uuid| direct.contains(uuid))
                .filter_map(|uuid| names.get(uuid).cloned())
                .collect();
            if !direct_failures.is_empty() {
                return Err(Error::PrecompileError(direct_failures));
            }
        }
        Ok(report)
    }

    /// `instantiate` (`spec.md §4.9`): synthesises a project from the manifest when the project
    /// file is missing, ensures every manifest uuid is a project dep, materialises repo-tracked
    /// packages via git, downloads sources/artifacts, runs build scripts, then auto-precompiles.
    pub fn instantiate(
        &self,
        runtime: &mut Runtime,
        project_file: &Path,
        manifest_file: &Path,
        depot: &Depot,
        options: &InstantiateOptions,
    ) -> Result<EnvironmentCache> {
        let manifest = self.io.read_manifest(manifest_file)?;
        let mut project = if project_file.exists() {
            self.io.read_project(project_file)?
        } else {
            synthesize_project(&manifest)?
        };

        for (uuid, entry) in &manifest.0 {
            if !project.deps.values().any(|v| v == uuid) {
                project.deps.insert(entry.name.clone(), *uuid);
            }
        }
        self.io.write_project(project_file, &project)?;

        for (uuid, entry) in &manifest.0 {
            if let Some(repo) = &entry.repo {
                let mirror = depot.clone_dir(&repo.source);
                if mirror.exists() {
                    self.git.fetch(&mirror).map_err(|e| wrap_git_failure(*uuid, e))?;
                } else {
                    self.git.clone_bare(&repo.source, &mirror).map_err(|e| wrap_git_failure(*uuid, e))?;
                }
                if let Some(tree_hash) = &entry.tree_hash {
                    let dest = depot.package_dir(&entry.name, tree_hash);
                    self.git
                        .checkout_tree_hash(&mirror, tree_hash, &dest)
                        .map_err(|e| wrap_git_failure(*uuid, e))?;
                }
            } else if let Some(tree_hash) = &entry.tree_hash {
                let dest = depot.package_dir(&entry.name, tree_hash);
                if !dest.exists() {
                    self.downloader.download_source(*uuid, tree_hash, &dest)?;
                }
                if let Some(platform) = &options.platform {
                    let artifact_dest = depot.artifact_dir(tree_hash);
                    if !artifact_dest.exists() {
                        self.downloader.download_artifact(tree_hash, platform, &artifact_dest)?;
                    }
                }
            }

            if let Some(tree_hash) = &entry.tree_hash {
                let path = depot.package_dir(&entry.name, tree_hash);
                self.build_runner.run_build_script(*uuid, &path)?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        if self.precompile_auto {
            let _ = self.precompile(
                runtime,
                project_file,
                manifest_file,
                Some(depot),
                false,
                PrecompileOptions { verbose: options.verbose },
            );
        }

        let cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;
        runtime.undo_log.snapshot(&cache, &now);
        Ok(cache)
    }

    /// `build` (`spec.md §4.9`/§6): re-runs build scripts for `specs` (every manifest entry with
    /// a resolved tree hash if `specs` is empty), without touching git mirrors or downloads.
    pub fn build(&self, project_file: &Path, manifest_file: &Path, depot: &Depot, specs: &[PackageSpec]) -> Result<()> {
        let cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;
        let targets: Vec<Uuid> = if specs.is_empty() {
            cache.manifest.0.keys().copied().collect()
        } else {
            let resolved = cache.resolve_manifest(specs)?;
            EnvironmentCache::ensure_resolved(&resolved)?;
            resolved.iter().filter_map(|spec| spec.id.uuid).collect()
        };

        for uuid in targets {
            let Some(entry) = cache.manifest.get(&uuid) else { continue };
            let Some(tree_hash) = &entry.tree_hash else { continue };
            let path = depot.package_dir(&entry.name, tree_hash);
            self.build_runner.run_build_script(uuid, &path)?;
        }
        Ok(())
    }

    /// `test` (`spec.md §4.9`/§6): runs each named package's test suite (every direct project dep
    /// if `specs` is empty).
    pub fn test(
        &self,
        project_file: &Path,
        manifest_file: &Path,
        depot: &Depot,
        specs: &[PackageSpec],
        options: &TestOptions,
    ) -> Result<()> {
        let cache = EnvironmentCache::load(self.io, project_file, manifest_file)?;
        let targets: Vec<Uuid> = if specs.is_empty() {
            cache.project.deps.values().copied().collect()
        } else {
            let resolved = cache.resolve_project_deps(specs)?;
            EnvironmentCache::ensure_resolved(&resolved)?;
            resolved.iter().filter_map(|spec| spec.id.uuid).collect()
        };

        for uuid in targets {
            let Some(entry) = cache.manifest.get(&uuid) else { continue };
            let Some(tree_hash) = &entry.tree_hash else { continue };
            let path = depot.package_dir(&entry.name, tree_hash);
            self.build_runner.run_tests(uuid, &path, options)?;
        }
        Ok(())
    }

    /// `activate` (`spec.md §4.9`, §9): switches the active project. `options.shared`/`.temp`
    /// describe where the caller sourced `target` from (a shared depot location or a scratch
    /// directory it created itself) -- `depot_core` has no notion of creating either, only of
    /// entering one, so both fields are accepted but not interpreted here.
    pub fn activate<'r>(
        &self,
        runtime: &'r mut Runtime,
        target: impl Into<PathBuf>,
        options: &crate::options::ActivateOptions,
    ) -> crate::runtime::ActivationGuard<'r> {
        let _ = (options.shared, options.temp);
        runtime.activate(target)
    }
}

fn wrap_git_failure(uuid: Uuid, error: Error) -> Error {
    match error {
        Error::GitFailure { .. } => error,
        other => Error::GitFailure { uuid, message: other.to_string() },
    }
}

fn synthesize_project(manifest: &Manifest) -> Result<Project> {
    let mut project = Project::default();
    for (uuid, entry) in &manifest.0 {
        if project.deps.contains_key(&entry.name) {
            return Err(Error::invalid_spec(format!(
                "cannot synthesise a project file: duplicate top-level name `{}`",
                entry.name
            )));
        }
        project.deps.insert(entry.name.clone(), *uuid);
    }
    Ok(project)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collaborators::{CompileOutcome, SilentProgress};
    use crate::project::ManifestEntry;
    use crate::spec::PackageId;
    use std::cell::RefCell;
    use std::collections::HashMap as StdHashMap;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FakeIo {
        projects: RefCell<StdHashMap<PathBuf, Project>>,
        manifests: RefCell<StdHashMap<PathBuf, Manifest>>,
    }

    impl ProjectManifestIo for FakeIo {
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

    struct FakeResolver;
    impl Resolver for FakeResolver {
        fn resolve(
            &self,
            specs: &[PackageSpec],
            _project: &Project,
            manifest: &Manifest,
            _update_registry: bool,
            _preserve: crate::options::Preserve,
            _platform: Option<&str>,
        ) -> Result<Manifest> {
            let mut manifest = manifest.clone();
            for spec in specs {
                let Some(name) = &spec.id.name else { continue };
                let uuid = spec.id.uuid.unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()));
                manifest.insert(
                    uuid,
                    ManifestEntry {
                        name: name.clone(),
                        tree_hash: Some("abcdef0123456789abcdef0123456789abcdef01".to_owned()),
                        ..Default::default()
                    },
                );
            }
            Ok(manifest)
        }
    }

    struct FakeDownloader;
    impl Downloader for FakeDownloader {
        fn download_source(&self, _uuid: Uuid, _tree_hash: &str, _dest: &Path) -> Result<()> {
            Ok(())
        }
        fn download_artifact(&self, _tree_hash: &str, _platform: &str, _dest: &Path) -> Result<()> {
            Ok(())
        }
    }

    struct FakeGit;
    impl GitProvider for FakeGit {
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

    struct FakeBuildRunner;
    impl BuildRunner for FakeBuildRunner {
        fn is_fresh(&self, _uuid: Uuid, _cached: &[PathBuf]) -> Result<bool> {
            Ok(false)
        }
        fn compile(&self, _uuid: Uuid) -> Result<CompileOutcome> {
            Ok(CompileOutcome::Compiled)
        }
        fn run_build_script(&self, _uuid: Uuid, _path: &Path) -> Result<()> {
            Ok(())
        }
        fn run_tests(&self, _uuid: Uuid, _path: &Path, _options: &TestOptions) -> Result<()> {
            Ok(())
        }
    }

    fn dispatcher<'a>(
        io: &'a FakeIo,
        resolver: &'a FakeResolver,
        downloader: &'a FakeDownloader,
        git: &'a FakeGit,
        build_runner: &'a FakeBuildRunner,
    ) -> Dispatcher<'a> {
        Dispatcher {
            io,
            resolver,
            downloader,
            git,
            build_runner,
            progress: &SilentProgress,
            reserved_names: vec!["core".to_owned()],
            precompile_auto: false,
            precompile_tasks: 4,
            suspended_file: PathBuf::from("/env/suspended.toml"),
        }
    }

    #[test]
    fn add_writes_project_and_manifest_and_records_undo_snapshot() {
        let io = FakeIo::default();
        let resolver = FakeResolver;
        let downloader = FakeDownloader;
        let git = FakeGit;
        let build_runner = FakeBuildRunner;
        let dispatcher = dispatcher(&io, &resolver, &downloader, &git, &build_runner);

        let mut runtime = Runtime::new("1.0.0");
        let specs = vec![PackageSpec::named("Foo")];
        let cache = dispatcher
            .add(
                &mut runtime,
                Path::new("/env/Project.toml"),
                Path::new("/env/Manifest.toml"),
                &specs,
                &AddOptions::default(),
                "2026-01-01",
            )
            .unwrap();

        assert!(cache.project.deps.contains_key("Foo"));
        assert!(runtime.undo_log.history(&PathBuf::from("/env/Project.toml")).is_some());
    }

    #[test]
    fn rm_removes_from_both_project_and_manifest() {
        let io = FakeIo::default();
        let uuid = Uuid::from_u128(1);
        let mut project = Project::default();
        project.deps.insert("Foo".to_owned(), uuid);
        io.projects.borrow_mut().insert(PathBuf::from("/env/Project.toml"), project);
        let mut manifest = Manifest::default();
        manifest.insert(uuid, ManifestEntry { name: "Foo".to_owned(), ..Default::default() });
        io.manifests.borrow_mut().insert(PathBuf::from("/env/Manifest.toml"), manifest);

        let resolver = FakeResolver;
        let downloader = FakeDownloader;
        let git = FakeGit;
        let build_runner = FakeBuildRunner;
        let dispatcher = dispatcher(&io, &resolver, &downloader, &git, &build_runner);

        let mut runtime = Runtime::new("1.0.0");
        let specs = vec![PackageSpec {
            id: PackageId { name: Some("Foo".to_owned()), uuid: None },
            version: None,
            tree_hash: None,
            pinned: false,
            mode: spec::Mode::Project,
            tracking: Tracking::Registry,
        }];
        let cache = dispatcher
            .rm(
                &mut runtime,
                Path::new("/env/Project.toml"),
                Path::new("/env/Manifest.toml"),
                &specs,
                &RmOptions::default(),
                "2026-01-01",
            )
            .unwrap();

        assert!(!cache.project.deps.contains_key("Foo"));
        assert!(cache.manifest.get(&uuid).is_none());
    }

    #[test]
    fn pin_sets_pinned_flag_on_the_resolved_entry() {
        let io = FakeIo::default();
        let uuid = Uuid::from_u128(1);
        let mut project = Project::default();
        project.deps.insert("Foo".to_owned(), uuid);
        io.projects.borrow_mut().insert(PathBuf::from("/env/Project.toml"), project);
        let mut manifest = Manifest::default();
        manifest.insert(uuid, ManifestEntry { name: "Foo".to_owned(), ..Default::default() });
        io.manifests.borrow_mut().insert(PathBuf::from("/env/Manifest.toml"), manifest);

        let resolver = FakeResolver;
        let downloader = FakeDownloader;
        let git = FakeGit;
        let build_runner = FakeBuildRunner;
        let dispatcher = dispatcher(&io, &resolver, &downloader, &git, &build_runner);

        let mut runtime = Runtime::new("1.0.0");
        let specs = vec![PackageSpec::named("Foo")];
        let cache = dispatcher
            .pin(&mut runtime, Path::new("/env/Project.toml"), Path::new("/env/Manifest.toml"), &specs, "2026-01-01")
            .unwrap();

        assert!(cache.manifest.get(&uuid).unwrap().pinned);
    }
}
