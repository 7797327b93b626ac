//! Thin `git2` wrapper. Grounded in `dylint_internal::git::checkout`; extended with the
//! bare-clone/fetch operations `instantiate` needs to populate `clones/<hash>/`
//! (`spec.md §4.9`).

use anyhow::Result;
use git2::Repository;
use if_chain::if_chain;
use std::path::Path;

/// Clones `url` into `path` and checks out `refname`, leaving a normal (non-bare) working tree.
///
/// Based on <https://stackoverflow.com/a/67240436>, same as the teacher's `git.rs`.
pub fn checkout(url: &str, refname: &str, path: &Path) -> Result<()> {
    let repository = Repository::clone(url, path)?;

    let (object, reference) = repository.revparse_ext(refname)?;

    repository.checkout_tree(&object, None)?;

    if_chain! {
        if let Some(reference) = reference;
        if let Some(refname) = reference.name();
        then {
            repository.set_head(refname)?;
        } else {
            repository.set_head_detached(object.id())?;
        }
    }

    Ok(())
}

/// Clones `url` as a bare mirror into `path`, for the shared `clones/<hash>/` tree. Bare because
/// depot clones are never worked in directly; `packages/<name>/<slug>/` holds the working tree
/// checked out from them.
pub fn clone_bare(url: &str, path: &Path) -> Result<Repository> {
    let mut builder = git2::build::RepoBuilder::new();
    builder.bare(true);
    Ok(builder.clone(url, path)?)
}

/// Fetches all refs into an existing bare mirror.
pub fn fetch(repository: &Repository) -> Result<()> {
    let mut remote = repository.find_remote("origin")?;
    remote.fetch(&["+refs/*:refs/*"], None, None)?;
    Ok(())
}

/// Checks out the tree identified by `tree_hash` (a git-tree SHA-1) from `repository`, a bare
/// mirror, into `dest` (a fresh `packages/<name>/<slug>/` directory).
pub fn checkout_tree_hash(repository: &Repository, tree_hash: &str, dest: &Path) -> Result<()> {
    let oid = git2::Oid::from_str(tree_hash)?;
    let tree = repository.find_tree(oid)?;
    std::fs::create_dir_all(dest)?;
    let mut opts = git2::build::CheckoutBuilder::new();
    opts.target_dir(dest).force();
    repository.checkout_tree(tree.as_object(), Some(&mut opts))?;
    Ok(())
}
