//! Concrete `GitProvider`: a thin adapter over `depot_internal::git`:: git2 wrapper.

use depot_core::error::{Error, Result};
use depot_core::GitProvider;
use git2::Repository;
use std::path::Path;

pub struct Git2Provider;

impl GitProvider for Git2Provider {
    fn clone_bare(&self, source: &str, dest: &Path) -> Result<()> {
        depot_internal::clone_bare(source, dest)
            .map(|_repository| ())
            .map_err(Error::Other)
    }

    fn fetch(&self, mirror: &Path) -> Result<()> {
        let repository = Repository::open(mirror)
            .map_err(|err| Error::Other(anyhow::anyhow!("could not open `{}`: {err}", mirror.display())))?;
        depot_internal::fetch(&repository).map_err(Error::Other)
    }

    fn checkout_tree_hash(&self, mirror: &Path, tree_hash: &str, dest: &Path) -> Result<()> {
        let repository = Repository::open(mirror)
            .map_err(|err| Error::Other(anyhow::anyhow!("could not open `{}`: {err}", mirror.display())))?;
        depot_internal::checkout_tree_hash(&repository, tree_hash, dest).map_err(Error::Other)
    }
}
