//! Error taxonomy (`spec.md §7`). Kinds, not type hierarchies: every fallible entry point in
//! this crate returns `Result<T, Error>`, and the variants below are exactly the kinds the spec
//! enumerates.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    /// Spec validation failed: bad name, conflicting fields, duplicate, reserved name. Fatal to
    /// the current operation; never retried.
    #[error("{0}")]
    InvalidSpec(String),

    /// A spec could not be bound to a uuid from the environment.
    #[error("could not resolve the following package specifications: {0:?}")]
    UnresolvedSpec(Vec<String>),

    /// Package absent from manifest when required (rm, free, pin).
    #[error("package `{0}` is not in the manifest")]
    NotFound(String),

    /// Filesystem read/write failure. Fatal outside GC/usage-ledger code paths, which instead
    /// log and treat the file as missing.
    #[error("io failure for `{path}`: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML. Fatal outside GC, which treats it as an empty file.
    #[error("could not parse `{path}`: {source}")]
    ParseFailure {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Registry refresh or lookup failed.
    #[error("registry failure: {0}")]
    RegistryFailure(String),

    /// Clone/fetch/checkout failed, or the requested tree-hash was not found after fetch.
    #[error("git failure for package `{uuid}`: {message}")]
    GitFailure { uuid: Uuid, message: String },

    /// The external compile routine failed for one or more packages. Aggregated by the
    /// scheduler; only direct-dependency failures are reported in full when the invocation was
    /// user-initiated (`spec.md §4.8` step 5, §7).
    #[error("precompilation failed for: {0:?}")]
    PrecompileError(Vec<String>),

    /// Cooperative cancellation. Not really a failure: the scheduler returns this to signal
    /// "stopped early, no aggregate error to report".
    #[error("interrupted")]
    Interrupted,

    /// Catch-all for collaborator errors the core does not interpret further (e.g. a resolver
    /// failure that isn't a registry fetch).
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    #[must_use]
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec(message.into())
    }
}
