//! Environment Cache (`spec.md §4.2`): holds the parsed project file, manifest, and original
//! snapshots for diff/undo.

use crate::collaborators::ProjectManifestIo;
use crate::error::{Error, Result};
use crate::project::{Manifest, Project};
use crate::spec::PackageSpec;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct EnvironmentCache {
    pub project_file: PathBuf,
    pub manifest_file: PathBuf,
    pub project: Project,
    pub manifest: Manifest,
    pub original_project: Project,
    pub original_manifest: Manifest,
}

impl EnvironmentCache {
    pub fn load(io: &dyn ProjectManifestIo, project_file: &Path, manifest_file: &Path) -> Result<Self> {
        let project = if project_file.exists() {
            io.read_project(project_file)?
        } else {
            Project::default()
        };
        let manifest = if manifest_file.exists() {
            io.read_manifest(manifest_file)?
        } else {
            Manifest::default()
        };
        Ok(Self {
            project_file: project_file.to_path_buf(),
            manifest_file: manifest_file.to_path_buf(),
            original_project: project.clone(),
            original_manifest: manifest.clone(),
            project,
            manifest,
        })
    }

    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.project == self.original_project && self.manifest == self.original_manifest
    }

    pub fn write(&self, io: &dyn ProjectManifestIo) -> Result<()> {
        self.manifest.check_transitively_closed()?;
        io.write_project(&self.project_file, &self.project)?;
        io.write_manifest(&self.manifest_file, &self.manifest)?;
        Ok(())
    }

    /// Fills in a missing `uuid` from `name` (or vice versa) by consulting the current project.
    /// Fails with `UnresolvedSpec` if a name has no entry, or `InvalidSpec` if a bare uuid
    /// matches no project dependency (ambiguity only arises for names, since uuids are unique).
    pub fn resolve_project_deps(&self, specs: &[PackageSpec]) -> Result<Vec<PackageSpec>> {
        self.resolve_against(specs, |name| self.project.deps.get(name).copied())
    }

    /// As `resolve_project_deps`, but against the manifest (by package name) -- used by `rm`,
    /// `free`, `pin`, which operate over manifest entries rather than direct project deps.
    pub fn resolve_manifest(&self, specs: &[PackageSpec]) -> Result<Vec<PackageSpec>> {
        self.resolve_against(specs, |name| {
            self.manifest.find_by_name(name).map(|(uuid, _)| uuid)
        })
    }

    fn resolve_against(
        &self,
        specs: &[PackageSpec],
        lookup_by_name: impl Fn(&str) -> Option<Uuid>,
    ) -> Result<Vec<PackageSpec>> {
        let mut resolved = Vec::with_capacity(specs.len());
        let mut unresolved = Vec::new();

        for spec in specs {
            let mut spec = spec.clone();
            match (&spec.id.name, spec.id.uuid) {
                (Some(_), Some(_)) => {}
                (Some(name), None) => {
                    if let Some(uuid) = lookup_by_name(name) {
                        spec.id.uuid = Some(uuid);
                    } else {
                        unresolved.push(name.clone());
                        resolved.push(spec);
                        continue;
                    }
                }
                (None, Some(uuid)) => {
                    if let Some(name) = self.name_for_uuid(uuid) {
                        spec.id.name = Some(name);
                    }
                    // smoelius: a bare uuid with no matching manifest/project entry is left
                    // as-is; whether that's an error depends on the operation (e.g. `add
                    // --uuid` for a brand-new package is fine), so only `ensure_resolved`
                    // (a terminal, not best-effort, check) rejects it.
                }
                (None, None) => {
                    unresolved.push("<empty spec>".to_owned());
                    resolved.push(spec);
                    continue;
                }
            }
            resolved.push(spec);
        }

        if !unresolved.is_empty() {
            return Err(Error::UnresolvedSpec(unresolved));
        }

        Ok(resolved)
    }

    fn name_for_uuid(&self, uuid: Uuid) -> Option<String> {
        self.project
            .deps
            .iter()
            .find(|(_, v)| **v == uuid)
            .map(|(k, _)| k.clone())
            .or_else(|| self.manifest.get(&uuid).map(|entry| entry.name.clone()))
    }

    /// Terminal check: every spec now has both a name and a uuid. `spec.md §4.2` calls this
    /// `ensure_resolved`.
    pub fn ensure_resolved(specs: &[PackageSpec]) -> Result<()> {
        let offenders: Vec<String> = specs
            .iter()
            .filter(|spec| spec.id.name.is_none() || spec.id.uuid.is_none())
            .map(|spec| {
                spec.id
                    .name
                    .clone()
                    .or_else(|| spec.id.uuid.map(|u| u.to_string()))
                    .unwrap_or_else(|| "<empty spec>".to_owned())
            })
            .collect();
        if offenders.is_empty() {
            Ok(())
        } else {
            Err(Error::UnresolvedSpec(offenders))
        }
    }
}
