//! Concrete `ProjectManifestIo`: reads/writes `Project.toml`/`Manifest.toml` with
//! `toml_edit`'s serde-compatible facade (`dylint/src/toml.rs`'s `toml_edit::easy as toml`
//! pattern), atomically via `depot_internal::atomic_write`.

use depot_core::error::{Error, Result};
use depot_core::project::{Manifest, Project};
use depot_core::ProjectManifestIo;
use std::path::Path;
use toml_edit::easy as toml;

pub struct TomlProjectManifestIo;

impl ProjectManifestIo for TomlProjectManifestIo {
    fn read_project(&self, path: &Path) -> Result<Project> {
        read_toml(path)
    }

    fn write_project(&self, path: &Path, project: &Project) -> Result<()> {
        write_toml(path, project)
    }

    fn read_manifest(&self, path: &Path) -> Result<Manifest> {
        read_toml(path)
    }

    fn write_manifest(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        write_toml(path, manifest)
    }
}

fn read_toml<T: Default + serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| Error::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|err| Error::Other(anyhow::anyhow!("could not parse `{}`: {err}", path.display())))
}

fn write_toml<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = toml::to_string_pretty(value)
        .map_err(|err| Error::Other(anyhow::anyhow!("could not serialise `{}`: {err}", path.display())))?;
    depot_internal::atomic_write(path, &contents).map_err(Error::Other)
}
