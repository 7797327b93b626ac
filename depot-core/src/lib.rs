//! Package and artifact lifecycle engine.
//!
//! This crate has no knowledge of any concrete registry, network client, git binary, or compiler
//! -- those are the collaborator traits in [`collaborators`], implemented in `depot-cli` (or by
//! fakes in this crate's own tests). What lives here is the part that doesn't need any of that:
//! spec validation, the project/manifest data model, the environment cache and undo log, the
//! garbage collector, the precompile scheduler, and the dispatcher that ties a CLI frontend's
//! verbs (`add`, `rm`, `up`, `gc`, ...) to all of the above.

pub mod collaborators;
pub mod depot;
pub mod dispatcher;
pub mod env_cache;
pub mod error;
pub mod gc;
pub mod options;
pub mod orphanage;
pub mod precompile;
pub mod project;
pub mod reachability;
pub mod runtime;
pub mod spec;
pub mod undo;
pub mod usage_ledger;

pub use collaborators::{BuildRunner, CompileOutcome, Downloader, GitProvider, ProgressSink, ProjectManifestIo, Resolver, SilentProgress};
pub use depot::Depot;
pub use dispatcher::Dispatcher;
pub use env_cache::EnvironmentCache;
pub use error::{Error, Result};
pub use gc::GcSummary;
pub use options::{
    ActivateOptions, AddOptions, FreeOptions, GcOptions, InstantiateOptions, Level, Mode as OperationMode,
    PrecompileOptions, Preserve, RmOptions, StatusOptions, TestOptions, UpOptions,
};
pub use precompile::{Latch, PrecompileReport, Scheduler, Semaphore, SuspendedList};
pub use project::{Manifest, ManifestEntry, Project, RepoSource};
pub use runtime::{ActivationGuard, Runtime};
pub use spec::{Operation, PackageId, PackageSpec, Tracking, VersionSpec};
pub use undo::{UndoHistory, UndoLog, UndoSnapshot};
