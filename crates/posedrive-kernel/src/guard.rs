//! [`ProcessingGuard`] – at-most-one-in-flight admission flag.
//!
//! The producer context acquires the guard before evaluating a sample. The
//! acquisition hands back a [`Completion`] token, which travels to the sink
//! context behind the sample's dispatched commands. Running (or dropping) the
//! token on the sink context clears the guard, admitting the next sample.
//!
//! The flag is an [`AtomicBool`]: acquisition is a `compare_exchange` with
//! acquire semantics and the clear is a release store, so the baseline
//! updates made while the guard was held are visible to whichever thread
//! admits the next sample.
//!
//! # Example
//!
//! ```
//! use posedrive_kernel::guard::ProcessingGuard;
//!
//! let guard = ProcessingGuard::new();
//! let token = guard.try_acquire().expect("guard starts clear");
//! assert!(guard.is_set());
//! assert!(guard.try_acquire().is_none()); // second sample is refused
//!
//! token.complete();
//! assert!(!guard.is_set());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag marking a sample as in flight between producer and sink.
///
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct ProcessingGuard {
    busy: Arc<AtomicBool>,
}

impl ProcessingGuard {
    /// Create a guard in the clear state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the guard if it is clear.
    ///
    /// Returns the [`Completion`] that clears it again, or `None` when a
    /// previous sample is still in flight.
    pub fn try_acquire(&self) -> Option<Completion> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Completion {
                busy: Arc::clone(&self.busy),
            })
    }

    /// `true` while a sample is in flight.
    pub fn is_set(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Token that clears its [`ProcessingGuard`] when completed or dropped.
///
/// A sink that shuts down with tokens still queued drops them, which also
/// releases the guard.
#[derive(Debug)]
#[must_use = "dropping a Completion immediately clears the processing guard"]
pub struct Completion {
    busy: Arc<AtomicBool>,
}

impl Completion {
    /// Mark the in-flight sample's effects as done.
    pub fn complete(self) {
        drop(self);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_guard_is_clear() {
        assert!(!ProcessingGuard::new().is_set());
    }

    #[test]
    fn acquire_is_exclusive() {
        let guard = ProcessingGuard::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.try_acquire().is_none());
        assert!(guard.try_acquire().is_none());
    }

    #[test]
    fn dropping_token_clears_guard() {
        let guard = ProcessingGuard::new();
        {
            let _token = guard.try_acquire().unwrap();
            assert!(guard.is_set());
        }
        assert!(!guard.is_set());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = ProcessingGuard::new();
        let other = guard.clone();
        let token = guard.try_acquire().unwrap();
        assert!(other.is_set());
        token.complete();
        assert!(!other.is_set());
    }

    #[test]
    fn completion_on_another_thread_is_visible() {
        let guard = ProcessingGuard::new();
        let token = guard.try_acquire().unwrap();
        thread::spawn(move || token.complete()).join().unwrap();
        assert!(!guard.is_set());
    }
}
