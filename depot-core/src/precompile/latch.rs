//! One-shot and broadcast latches (`spec.md §4.8`): `Mutex<bool>` + `Condvar`, notified exactly
//! once, observable without blocking via [`Latch::is_set`].

use std::sync::{Condvar, Mutex};

#[derive(Default)]
pub struct Latch {
    set: Mutex<bool>,
    condvar: Condvar,
}

impl Latch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: a second `notify` is a no-op.
    pub fn notify(&self) {
        let mut set = self.set.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *set = true;
        self.condvar.notify_all();
    }

    pub fn wait(&self) {
        let mut set = self.set.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while !*set {
            set = self
                .condvar
                .wait(set)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.set.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
