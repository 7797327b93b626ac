//! Low-level, dependency-light helpers shared by `depot_core` and the `depot` CLI.
//!
//! Mirrors the split used by `dylint_internal`: environment variable names,
//! a `Command` extension trait, path/hash helpers, home-directory resolution
//! and a thin git wrapper all live here so the engine crate never touches a
//! raw `std::process::Command` or `std::env::var` directly.

mod atomic;
mod command;
pub mod env;
#[cfg(feature = "git")]
mod git;
pub mod hashing;
pub mod home;

pub use atomic::atomic_write;
pub use command::CommandExt;
#[cfg(feature = "git")]
pub use git::{checkout, checkout_tree_hash, clone_bare, fetch};
