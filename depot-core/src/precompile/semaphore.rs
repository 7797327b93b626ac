//! Counting semaphore (`spec.md §4.8` `parallel_limiter`): `Mutex<usize>` + `Condvar`.

use std::sync::{Condvar, Mutex};

pub struct Semaphore {
    permits: Mutex<usize>,
    condvar: Condvar,
}

impl Semaphore {
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    pub fn acquire(&self) -> Permit<'_> {
        let mut permits = self.permits.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        while *permits == 0 {
            permits = self
                .condvar
                .wait(permits)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        *permits -= 1;
        Permit { semaphore: self }
    }

    fn release(&self) {
        let mut permits = self.permits.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *permits += 1;
        self.condvar.notify_one();
    }
}

/// Releases its permit on drop so a panicking compile call can't leak concurrency slots.
pub struct Permit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}


#[cfg(test)]
impl Semaphore {
    fn release_for_test(&self) {
        self.release();
    }
}
