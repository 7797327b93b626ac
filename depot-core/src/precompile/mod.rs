//! Precompile Scheduler (`spec.md §4.8`): a bounded-concurrency DAG walk with cycle detection,
//! cooperative cancellation, and cross-run suspension of repeatedly-failing packages.

pub mod latch;
pub mod semaphore;
pub mod suspended;

use crate::collaborators::{BuildRunner, CompileOutcome, ProgressSink};
pub use latch::Latch;
pub use semaphore::Semaphore;
pub use suspended::SuspendedList;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrecompileReport {
    pub compiled: BTreeSet<Uuid>,
    /// Packages whose cached artefact was already fresh -- `spec.md §4.8` step 3's
    /// `n_already_precomp` counter. Disjoint from `compiled`: these never called `compile`.
    pub already_precompiled: BTreeSet<Uuid>,
    pub skipped: BTreeSet<Uuid>,
    pub circular: BTreeSet<Uuid>,
    /// `uuid -> captured stderr`, populated only for packages directly requested by the
    /// triggering invocation (`spec.md §4.8` step 5).
    pub failed: BTreeMap<Uuid, String>,
    pub precompile_errors: BTreeSet<Uuid>,
    pub interrupted: bool,
}

#[derive(Default)]
struct Shared {
    compiled: BTreeSet<Uuid>,
    already_precomp: BTreeSet<Uuid>,
    skipped: BTreeSet<Uuid>,
    failed: BTreeMap<Uuid, String>,
    precompile_errors: BTreeSet<Uuid>,
    n_done: usize,
}

/// DFS over `graph` producing the set of packages transitively reachable from themselves.
/// Dependents of a circular package see its `processed` latch pre-notified so they never
/// deadlock (`spec.md §4.8`).
fn detect_cycles(graph: &BTreeMap<Uuid, Vec<Uuid>>) -> BTreeSet<Uuid> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum State {
        Visiting,
        Done,
    }

    let mut state: HashMap<Uuid, State> = HashMap::new();
    let mut circular = BTreeSet::new();

    fn visit(
        node: Uuid,
        graph: &BTreeMap<Uuid, Vec<Uuid>>,
        state: &mut HashMap<Uuid, State>,
        stack: &mut Vec<Uuid>,
        circular: &mut BTreeSet<Uuid>,
    ) {
        match state.get(&node) {
            Some(State::Done) => return,
            Some(State::Visiting) => {
                if let Some(pos) = stack.iter().position(|n| *n == node) {
                    circular.extend(stack[pos..].iter().copied());
                }
                return;
            }
            None => {}
        }
        state.insert(node, State::Visiting);
        stack.push(node);
        for &dep in graph.get(&node).into_iter().flatten() {
            visit(dep, graph, state, stack, circular);
        }
        stack.pop();
        state.insert(node, State::Done);
    }

    for &node in graph.keys() {
        let mut stack = Vec::new();
        visit(node, graph, &mut state, &mut stack, &mut circular);
    }

    circular
}

pub struct Scheduler<'a> {
    graph: &'a BTreeMap<Uuid, Vec<Uuid>>,
    names: &'a BTreeMap<Uuid, String>,
    /// Candidate cached-artefact paths per package, consulted by the staleness check
    /// (`spec.md §4.8` step 3) unless a dependency was recompiled this run. A package absent
    /// from this map, or mapped to an empty list, is always treated as stale.
    candidate_paths: &'a BTreeMap<Uuid, Vec<PathBuf>>,
    runner: &'a dyn BuildRunner,
    progress: &'a dyn ProgressSink,
}

impl<'a> Scheduler<'a> {
    #[must_use]
    pub fn new(
        graph: &'a BTreeMap<Uuid, Vec<Uuid>>,
        names: &'a BTreeMap<Uuid, String>,
        candidate_paths: &'a BTreeMap<Uuid, Vec<PathBuf>>,
        runner: &'a dyn BuildRunner,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            graph,
            names,
            candidate_paths,
            runner,
            progress,
        }
    }

    /// Runs the full DAG. `direct` is the set of packages the triggering invocation named
    /// explicitly (their failures get full stderr; transitive failures don't). `suspended` is
    /// mutated in place; the caller persists it after `run` returns.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &self,
        direct: &BTreeSet<Uuid>,
        suspended: &mut SuspendedList,
        project_path: &str,
        toolchain_version: &str,
        max_concurrency: usize,
        cancel: &Latch,
    ) -> PrecompileReport {
        let circular = detect_cycles(self.graph);

        let latches: HashMap<Uuid, Latch> = self.graph.keys().map(|&uuid| (uuid, Latch::new())).collect();
        for &uuid in &circular {
            latches[&uuid].notify();
        }

        let limiter = Semaphore::new(max_concurrency.max(1));
        let shared = Mutex::new(Shared::default());
        let suspended_mutex = Mutex::new(std::mem::take(suspended));
        let recompiled_deps: Mutex<BTreeSet<Uuid>> = Mutex::new(BTreeSet::new());
        let total = self.graph.len();

        std::thread::scope(|scope| {
            for &uuid in self.graph.keys() {
                if circular.contains(&uuid) {
                    let mut shared = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    shared.n_done += 1;
                    continue;
                }
                scope.spawn(|| {
                    self.run_one(
                        uuid,
                        direct,
                        &circular,
                        &latches,
                        &limiter,
                        &shared,
                        &suspended_mutex,
                        &recompiled_deps,
                        project_path,
                        toolchain_version,
                        cancel,
                        total,
                    );
                });
            }
        });

        *suspended = suspended_mutex.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        let shared = shared.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);

        self.progress.done(&[
            ("compiled", shared.compiled.len() as u64),
            ("already_precompiled", shared.already_precomp.len() as u64),
            ("skipped", shared.skipped.len() as u64),
            ("failed", shared.failed.len() as u64),
        ]);

        PrecompileReport {
            compiled: shared.compiled,
            already_precompiled: shared.already_precomp,
            skipped: shared.skipped,
            circular: circular.clone(),
            failed: shared.failed,
            precompile_errors: shared.precompile_errors,
            interrupted: cancel.is_set(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_one(
        &self,
        uuid: Uuid,
        direct: &BTreeSet<Uuid>,
        _circular: &BTreeSet<Uuid>,
        latches: &HashMap<Uuid, Latch>,
        limiter: &Semaphore,
        shared: &Mutex<Shared>,
        suspended: &Mutex<SuspendedList>,
        recompiled_deps: &Mutex<BTreeSet<Uuid>>,
        project_path: &str,
        toolchain_version: &str,
        cancel: &Latch,
        total: usize,
    ) {
        // Step 1: wait on every dependency's processed latch.
        for dep in self.graph.get(&uuid).into_iter().flatten() {
            latches[dep].wait();
        }

        let name = self.names.get(&uuid).cloned().unwrap_or_else(|| uuid.to_string());
        let any_dep_recompiled = self
            .graph
            .get(&uuid)
            .into_iter()
            .flatten()
            .any(|dep| recompiled_deps.lock().unwrap_or_else(std::sync::PoisonError::into_inner).contains(dep));

        if cancel.is_set() {
            self.finish(uuid, latches, shared, total, cancel);
            return;
        }

        // Step 2: suspension check.
        let is_suspended = suspended
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_suspended(project_path, toolchain_version, &name);
        if is_suspended && !any_dep_recompiled {
            shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner).skipped.insert(uuid);
            self.progress.item(&format!("{name}: skipped (suspended)"));
            self.finish(uuid, latches, shared, total, cancel);
            return;
        }

        if cancel.is_set() {
            self.finish(uuid, latches, shared, total, cancel);
            return;
        }

        // Step 3: staleness. Skipped outright if a dependency recompiled this run -- a fresh
        // artefact built against a stale dependency would be wrong, so step 5's `compile` always
        // runs in that case (`spec.md §4.8` step 3).
        if !any_dep_recompiled {
            const NO_CANDIDATES: Vec<PathBuf> = Vec::new();
            let candidates = self.candidate_paths.get(&uuid).unwrap_or(&NO_CANDIDATES);
            match self.runner.is_fresh(uuid, candidates) {
                Ok(true) => {
                    shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner).already_precomp.insert(uuid);
                    self.progress.item(&format!("{name}: already precompiled"));
                    self.finish(uuid, latches, shared, total, cancel);
                    return;
                }
                Ok(false) => {}
                Err(err) => log::warn!("could not check staleness for `{name}`: {err}"),
            }
        }

        if cancel.is_set() {
            self.finish(uuid, latches, shared, total, cancel);
            return;
        }

        let _permit = limiter.acquire();

        if cancel.is_set() {
            self.finish(uuid, latches, shared, total, cancel);
            return;
        }

        self.progress.item(&format!("{name}: compiling"));
        match self.runner.compile(uuid) {
            Ok(CompileOutcome::Compiled) => {
                recompiled_deps.lock().unwrap_or_else(std::sync::PoisonError::into_inner).insert(uuid);
                suspended
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .clear_suspension(project_path, toolchain_version, &name);
                shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner).compiled.insert(uuid);
            }
            Ok(CompileOutcome::PrecompilableLater) => {
                shared
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .precompile_errors
                    .insert(uuid);
            }
            Err(err) => {
                suspended
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .suspend(project_path, toolchain_version, &name);
                // Every failure is recorded; only a direct request gets the full message rather
                // than a placeholder, since transitive failures are expected to cascade and the
                // direct one is what a user investigates first (`spec.md §4.8` step 5).
                let message = if direct.contains(&uuid) {
                    err.to_string()
                } else {
                    "a transitive dependency failed to compile".to_owned()
                };
                shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner).failed.insert(uuid, message);
            }
        }

        self.finish(uuid, latches, shared, total, cancel);
    }

    fn finish(&self, uuid: Uuid, latches: &HashMap<Uuid, Latch>, shared: &Mutex<Shared>, total: usize, cancel: &Latch) {
        latches[&uuid].notify();
        let mut shared = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        shared.n_done += 1;
        if shared.n_done >= total {
            cancel.notify();
        }
    }
}
