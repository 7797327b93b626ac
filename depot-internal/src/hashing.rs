//! Deterministic, implementation-defined functions of name/tree-hash/source used to key depot
//! content (`spec.md §6`: "slug is an implementation-defined deterministic function of name and
//! tree-hash").

use sha1::{Digest, Sha1};

/// Lowercase hex SHA-1, the wire form `spec.md §6` mandates for git-tree hashes.
#[must_use]
pub fn hex_sha1(bytes: &[u8]) -> String {
    let digest = Sha1::digest(bytes);
    hex::encode(digest)
}

/// The slug under `packages/<name>/<slug>/`: derived from the tree-hash so that two packages
/// with the same name but different content never collide, and stable across runs.
#[must_use]
pub fn package_slug(tree_hash: &str) -> String {
    // smoelius: a short prefix keeps directory listings human-scannable; collisions within a
    // single package name are astronomically unlikely at 12 hex chars of a SHA-1.
    tree_hash.get(..12).unwrap_or(tree_hash).to_owned()
}

/// The key under `clones/<hash>/`: a hash of the git remote URL, so repeated `add --repo`s of
/// the same remote reuse one bare mirror.
#[must_use]
pub fn clone_cache_key(source: &str) -> String {
    hex_sha1(source.as_bytes())
}
