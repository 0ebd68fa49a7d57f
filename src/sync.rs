//! # Synchronization Primitives
//!
//! Interrupt-safe critical sections and the two polling semaphores used to
//! hand data from interrupt handlers to tasks.
//!
//! The semaphores never block or queue: a task polls `take()` on each
//! activation and simply returns if nothing was given.

use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::CriticalSection;

use crate::scheduler::{Scheduler, SharedScheduler};

/// Execute a closure within a critical section (interrupts disabled).
///
/// On Cortex-M the implementation comes from `cortex-m`'s
/// `critical-section-single-core` feature; host builds supply their own.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

/// Run `f` with exclusive access to a shared scheduler.
///
/// # Panics
/// If called re-entrantly from inside another `with_scheduler` on the same
/// scheduler.
#[inline]
pub fn with_scheduler<F, R>(shared: &SharedScheduler, f: F) -> R
where
    F: FnOnce(&mut Scheduler) -> R,
{
    critical_section(|cs| f(&mut shared.borrow_ref_mut(cs)))
}

// ---------------------------------------------------------------------------
// Raw one-byte semaphore cells
// ---------------------------------------------------------------------------

/// Take a binary semaphore: if the flag is set, clear it and succeed.
#[inline]
pub fn binary_take(flag: &AtomicU8) -> bool {
    flag.swap(0, Ordering::Acquire) != 0
}

/// Take a counting semaphore: if the count is positive, decrement it and
/// succeed.
#[inline]
pub fn counting_take(counter: &AtomicU8) -> bool {
    counter
        .fetch_update(Ordering::Acquire, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok()
}

// ---------------------------------------------------------------------------
// Semaphore types
// ---------------------------------------------------------------------------

/// A one-slot flag: any number of gives before a take count as one.
#[derive(Debug, Default)]
pub struct BinarySemaphore(AtomicU8);

impl BinarySemaphore {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    #[inline]
    pub fn give(&self) {
        self.0.store(1, Ordering::Release);
    }

    #[inline]
    pub fn take(&self) -> bool {
        binary_take(&self.0)
    }
}

/// Counts gives; each take consumes one. Saturates at `u8::MAX`.
#[derive(Debug, Default)]
pub struct CountingSemaphore(AtomicU8);

impl CountingSemaphore {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    #[inline]
    pub fn give(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Release, Ordering::Relaxed, |n| n.checked_add(1));
    }

    #[inline]
    pub fn take(&self) -> bool {
        counting_take(&self.0)
    }

    /// Number of gives not yet taken.
    pub fn count(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_take_once_per_give() {
        let sem = BinarySemaphore::new();
        assert!(!sem.take());

        sem.give();
        assert!(sem.take());
        assert!(!sem.take());

        // Repeated gives collapse into one.
        sem.give();
        sem.give();
        assert!(sem.take());
        assert!(!sem.take());
    }

    #[test]
    fn test_binary_take_any_nonzero() {
        let flag = AtomicU8::new(0x42);
        assert!(binary_take(&flag));
        assert_eq!(flag.load(Ordering::Relaxed), 0);
        assert!(!binary_take(&flag));
    }

    #[test]
    fn test_counting_take_n_times() {
        let sem = CountingSemaphore::new();
        for _ in 0..5 {
            sem.give();
        }
        assert_eq!(sem.count(), 5);
        for _ in 0..5 {
            assert!(sem.take());
        }
        assert!(!sem.take());
        assert_eq!(sem.count(), 0);
    }

    #[test]
    fn test_counting_give_saturates() {
        let sem = CountingSemaphore::new();
        for _ in 0..300 {
            sem.give();
        }
        assert_eq!(sem.count(), u8::MAX);
    }

    #[test]
    fn test_with_scheduler() {
        let shared = Scheduler::shared();
        let count = with_scheduler(&shared, |s| {
            s.register(|| {}, crate::task::Period::Every(1)).unwrap();
            s.task_count()
        });
        assert_eq!(count, 1);
    }
}
