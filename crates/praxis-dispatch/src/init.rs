//! One-shot registry population.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Runs a population pass at most once, however many callers race for it.
///
/// The fast path is a single atomic load. Callers that find the flag unset
/// serialise on a mutex and re-check it, so concurrent first callers wait for
/// the one pass in flight instead of starting their own.
///
/// # Example
///
/// ```rust
/// use praxis_dispatch::LazyInitializer;
///
/// let init = LazyInitializer::new();
/// assert!(init.ensure(|| {}));
/// assert!(!init.ensure(|| unreachable!()));
/// assert_eq!(init.passes(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LazyInitializer {
    populated: AtomicBool,
    lock: Mutex<()>,
    passes: AtomicUsize,
}

impl LazyInitializer {
    /// Creates an initializer that has not run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `populate` unless a pass has already completed.
    ///
    /// Returns `true` if this call ran the pass. If `populate` panics the flag
    /// stays unset and a later call runs it again.
    pub fn ensure<F: FnOnce()>(&self, populate: F) -> bool {
        if self.populated.load(Ordering::Acquire) {
            return false;
        }

        let _guard = self.lock.lock();
        if self.populated.load(Ordering::Acquire) {
            return false;
        }

        populate();
        self.passes.fetch_add(1, Ordering::AcqRel);
        self.populated.store(true, Ordering::Release);
        true
    }

    /// Returns `true` once a pass has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.populated.load(Ordering::Acquire)
    }

    /// Returns the number of completed passes.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_runs_once() {
        let init = LazyInitializer::new();
        assert!(!init.is_initialized());

        let mut runs = 0;
        assert!(init.ensure(|| runs += 1));
        assert!(!init.ensure(|| runs += 1));
        assert_eq!(runs, 1);
        assert!(init.is_initialized());
        assert_eq!(init.passes(), 1);
    }

    #[test]
    fn test_panicking_pass_is_retried() {
        let init = Arc::new(LazyInitializer::new());
        let cloned = Arc::clone(&init);
        let result = thread::spawn(move || cloned.ensure(|| panic!("boom"))).join();
        assert!(result.is_err());
        assert!(!init.is_initialized());
        assert!(init.ensure(|| {}));
        assert_eq!(init.passes(), 1);
    }

    #[test]
    fn test_concurrent_threads_share_one_pass() {
        let init = Arc::new(LazyInitializer::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let init = Arc::clone(&init);
                let runs = Arc::clone(&runs);
                thread::spawn(move || {
                    init.ensure(|| {
                        thread::sleep(Duration::from_millis(20));
                        runs.fetch_add(1, Ordering::SeqCst);
                    });
                    assert!(init.is_initialized());
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(init.passes(), 1);
    }
}
